pub mod embed_service;
pub mod filter_service;
pub mod parser_service;
pub mod time_service;
