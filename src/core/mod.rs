pub mod events;
pub mod file_drop;
pub mod registry;
pub mod scheduler;
pub mod stable;
pub mod track;
