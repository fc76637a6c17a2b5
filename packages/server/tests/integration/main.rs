mod common;
mod images;
mod openapi;
