use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{extract::State, http::HeaderMap, response::Html};

use crate::app::AppState;
use crate::auth::RequestContext;

/// POST /graphql - execute a query or mutation as the caller named by the
/// Authorization header.
pub async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let request = RequestContext::from_headers(&headers);
    state.schema.execute(req.into_inner().data(request)).await.into()
}

/// GET /graphql - GraphiQL explorer
pub async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
