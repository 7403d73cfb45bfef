pub mod descriptors;
pub mod router;
pub mod service;

pub use descriptors::{descriptor_for, AgentKind};
pub use router::{route, Route};
pub use service::{Action, PortfolioTeam, ResponseEnvelope};
