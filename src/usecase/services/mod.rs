pub mod classifier;
pub mod dirty_ledger;
pub mod edit_session;
pub mod session_registry;
pub mod update_command;
