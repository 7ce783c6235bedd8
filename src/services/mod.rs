pub mod advice;
pub mod classifier;
pub mod directory;
pub mod emergency;
pub mod extract;
pub mod flow;
pub mod reply;
pub mod selection;
