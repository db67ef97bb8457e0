//! Route lookup.
//!
//! # Responsibilities
//! - Store the routes for one HTTP method
//! - Look up the handler for (path, content type, accept)
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - More literal segments win over variables
//! - Ties break on content negotiation, then registration order
//! - Handlers that declare `consumes` only match those request types

use crate::content::negotiation::{accepts, media_type};
use crate::handlers::descriptor::Variables;
use crate::handlers::registry::HandlerType;
use crate::routing::template::UriTemplate;

/// Result of a successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub handler_type: HandlerType,
    pub variables: Variables,
}

#[derive(Debug)]
struct Route {
    handler_type: HandlerType,
}

impl Route {
    fn template(&self) -> &UriTemplate {
        self.handler_type.template()
    }

    /// None when the handler cannot take this request body type.
    fn consumes_rank(&self, content_type: Option<&str>) -> Option<u8> {
        let consumes = self.handler_type.consumed_types();
        if consumes.is_empty() {
            return Some(0);
        }
        let declared = media_type(content_type?);
        consumes
            .iter()
            .any(|c| media_type(c).eq_ignore_ascii_case(declared))
            .then_some(1)
    }

    fn produces_rank(&self, accept: Option<&[String]>) -> u8 {
        let produces = self.handler_type.produced_types();
        let satisfied = accept
            .into_iter()
            .flatten()
            .any(|range| produces.iter().any(|p| accepts(range, p)));
        u8::from(satisfied)
    }
}

/// Immutable routes for one HTTP method.
#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    /// Resolve a request to a handler type and its path variables.
    pub fn get(
        &self,
        path: &str,
        content_type: Option<&str>,
        accept: Option<&[String]>,
    ) -> Option<RouteMatch> {
        let mut best: Option<((usize, u8, u8), RouteMatch)> = None;

        for route in &self.routes {
            let Some(consumes_rank) = route.consumes_rank(content_type) else {
                continue;
            };
            let Some(variables) = route.template().match_path(path) else {
                continue;
            };

            let rank = (
                route.template().literal_count(),
                consumes_rank,
                route.produces_rank(accept),
            );
            if best.as_ref().map_or(true, |(current, _)| rank > *current) {
                best = Some((
                    rank,
                    RouteMatch {
                        handler_type: route.handler_type.clone(),
                        variables,
                    },
                ));
            }
        }

        best.map(|(_, matched)| matched)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Builds a routing table from candidate handler types.
#[derive(Debug, Default)]
pub struct RoutingTableBuilder {
    handler_types: Vec<HandlerType>,
}

impl RoutingTableBuilder {
    pub fn new(handler_types: impl IntoIterator<Item = HandlerType>) -> Self {
        Self {
            handler_types: handler_types.into_iter().collect(),
        }
    }

    pub fn build(self) -> RoutingTable {
        let routes = self
            .handler_types
            .into_iter()
            .map(|handler_type| Route { handler_type })
            .collect();
        RoutingTable { routes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::handler::handler_fn;
    use crate::handlers::registry::HandlerRegistration;
    use std::sync::Arc;

    fn route(name: &str, template: &str) -> HandlerRegistration {
        HandlerRegistration::new(name, "GET", template, handler_fn(|_, _| Ok(()))).unwrap()
    }

    fn table(registrations: Vec<HandlerRegistration>) -> RoutingTable {
        RoutingTableBuilder::new(registrations.into_iter().map(Arc::new)).build()
    }

    fn accept(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup_extracts_variables() {
        let table = table(vec![route("show", "/api/widgets/{id}")]);
        let matched = table.get("/api/widgets/42", None, None).unwrap();
        assert_eq!(matched.handler_type.name(), "show");
        assert_eq!(matched.variables.first("id"), Some("42"));
    }

    #[test]
    fn test_no_match() {
        let table = table(vec![route("show", "/api/widgets/{id}")]);
        assert!(table.get("/api/gadgets/1", None, None).is_none());
        assert!(RoutingTable::default().get("/", None, None).is_none());
    }

    #[test]
    fn test_literal_beats_variable() {
        let table = table(vec![
            route("show", "/api/widgets/{id}"),
            route("latest", "/api/widgets/latest"),
        ]);
        let matched = table.get("/api/widgets/latest", None, None).unwrap();
        assert_eq!(matched.handler_type.name(), "latest");
        assert!(matched.variables.is_empty());
    }

    #[test]
    fn test_accept_breaks_ties() {
        let table = table(vec![
            route("html", "/report").produces(["text/html"]),
            route("json", "/report").produces(["application/json"]),
        ]);

        let json = table.get("/report", None, Some(&accept(&["application/json"]))).unwrap();
        assert_eq!(json.handler_type.name(), "json");

        let html = table.get("/report", None, Some(&accept(&["text/html"]))).unwrap();
        assert_eq!(html.handler_type.name(), "html");

        let any = table.get("/report", None, Some(&accept(&["*/*"]))).unwrap();
        assert_eq!(any.handler_type.name(), "html");

        let none = table.get("/report", None, None).unwrap();
        assert_eq!(none.handler_type.name(), "html");
    }

    #[test]
    fn test_consumes_filters_and_ranks() {
        let table = table(vec![
            route("form", "/upload").consumes(["application/x-www-form-urlencoded"]),
            route("json", "/upload").consumes(["application/json"]),
        ]);

        let json = table
            .get("/upload", Some("application/json; charset=utf-8"), None)
            .unwrap();
        assert_eq!(json.handler_type.name(), "json");

        assert!(table.get("/upload", Some("text/csv"), None).is_none());
        assert!(table.get("/upload", None, None).is_none());
    }
}
