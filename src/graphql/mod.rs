pub mod inputs;
pub mod mutation;
pub mod query;
pub mod types;

use async_graphql::{Context, EmptySubscription, Schema};

use crate::auth::RequestContext;
use crate::services::MutationService;

pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the executable schema. The service is shared schema data; each
/// request attaches its own `RequestContext`.
pub fn build_schema(service: MutationService, max_depth: usize) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(service)
        .limit_depth(max_depth)
        .finish()
}

pub(crate) fn service<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a MutationService> {
    ctx.data::<MutationService>()
}

/// The caller's credential; a request executed without one is anonymous.
pub(crate) fn request(ctx: &Context<'_>) -> RequestContext {
    ctx.data_opt::<RequestContext>().cloned().unwrap_or_default()
}
