mod common;
mod routing;
mod script;
