pub mod create_event;
pub mod ensure_authenticated;
