//! The seven pipeline nodes, in execution order.
//!
//! Each node is a pure state transition: it receives the current
//! [`crate::state::ConversationState`] and returns a new one derived via
//! copy-with-overrides. Nodes that depend on a port hold it by `Arc`,
//! injected at pipeline construction.

mod classify_intent;
mod confirmation_gate;
mod execute_tool;
mod extract_entities;
mod generate_response;
mod normalize_input;
mod validate_request;

pub use classify_intent::ClassifyIntent;
pub use confirmation_gate::ConfirmationGate;
pub use execute_tool::ExecuteTool;
pub use extract_entities::ExtractEntities;
pub use generate_response::GenerateResponse;
pub use normalize_input::NormalizeInput;
pub use validate_request::ValidateRequest;
