//! Regex based route parser for the controller
use regex::Regex;

type ParamsConverter<R> = Box<Fn(Vec<&str>) -> Option<R>>;

/// Maps request paths to `Route` values. Routes are tested in
/// insertion order, first match wins.
pub struct RouteParser<R> {
    routes: Vec<(Regex, ParamsConverter<R>)>,
}

impl<R> Default for RouteParser<R> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<R> RouteParser<R> {
    /// Adds a route without params
    pub fn add_route<F>(&mut self, pattern: &str, f: F)
    where
        F: Fn() -> R + 'static,
    {
        self.add_route_with_params(pattern, move |_| Some(f()));
    }

    /// Adds a route with params extracted from regex capture groups
    pub fn add_route_with_params<F>(&mut self, pattern: &str, f: F)
    where
        F: Fn(Vec<&str>) -> Option<R> + 'static,
    {
        let regex = Regex::new(pattern).expect("Invalid regex pattern in route parser");
        self.routes.push((regex, Box::new(f)));
    }

    /// Tests a path against all registered routes
    pub fn test(&self, path: &str) -> Option<R> {
        self.routes
            .iter()
            .filter_map(|&(ref regex, ref converter)| {
                regex.captures(path).and_then(|captures| {
                    let params = captures
                        .iter()
                        .skip(1)
                        .filter_map(|capture| capture.map(|capture| capture.as_str()))
                        .collect::<Vec<_>>();
                    (*converter)(params)
                })
            }).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestRoute {
        Root,
        Item(i32),
    }

    #[test]
    fn test_route_parser() {
        let mut parser = RouteParser::default();
        parser.add_route(r"^/items$", || TestRoute::Root);
        parser.add_route_with_params(r"^/items/(\d+)$", |params| {
            params
                .get(0)
                .and_then(|string_id| string_id.parse::<i32>().ok())
                .map(TestRoute::Item)
        });

        assert_eq!(parser.test("/items"), Some(TestRoute::Root));
        assert_eq!(parser.test("/items/42"), Some(TestRoute::Item(42)));
        assert_eq!(parser.test("/items/abc"), None);
        assert_eq!(parser.test("/nothing"), None);
    }
}
