pub mod forwarder;
pub mod message_builder;

pub use forwarder::FailoverForwarder;
pub use message_builder::MessageBuilder;
