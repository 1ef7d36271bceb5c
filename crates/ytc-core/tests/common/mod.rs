pub mod oembed_server;
