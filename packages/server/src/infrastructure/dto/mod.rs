//! Data Transfer Objects (DTOs) for the chat server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame payloads
//! - `codec`: WebSocket frame decoding / encoding
//! - `http`: HTTP API request / response DTOs

pub mod codec;
pub mod conversion;
pub mod http;
pub mod websocket;
