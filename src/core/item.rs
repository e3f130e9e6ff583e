use crate::error::FilterError;

/// Result of processing one item.
///
/// - `Ok(Some(item))` passes the (possibly modified) item downstream
/// - `Ok(None)` drops the item from the pipeline
/// - `Err(error)` reports a failure the pipeline must handle itself
pub type ItemProcessorResult<O> = Result<Option<O>, FilterError>;

/// A stage of an event pipeline that turns one item into zero or one item.
///
/// Processors must be usable from several worker threads at once, so they
/// only read their own state.
pub trait ItemProcessor<I, O>: Send + Sync {
    fn process(&self, item: &I) -> ItemProcessorResult<O>;
}
