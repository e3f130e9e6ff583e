/// Records flowing through the pipeline and the capability the filter uses to touch them.
pub mod event;

/// Processing contract shared by pipeline stages.
pub mod item;
