use workload_mutator::ReviewContext;

pub(crate) struct ApiServerState {
    pub(crate) review_context: ReviewContext,
}
