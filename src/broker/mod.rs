pub mod engine;
pub mod outbound;
pub mod registry;
pub mod session;
pub mod topic;

pub use engine::Broker;
pub use outbound::OutboundQueues;
pub use registry::TopicRegistry;
pub use session::BrokerSession;

#[cfg(test)]
mod tests;
