mod common;
mod http_client;
mod routing;
mod validation;
mod view;
