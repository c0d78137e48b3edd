//! OpenAPI documentation configuration

use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

/// Combined OpenAPI documentation for the catalog API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Users, categories, book and food catalogs with paginated, filterable listings",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    modifiers(&BearerAuth),
    nest(
        (path = "/api/v2/auth", api = domain_users::AuthApiDoc),
        (path = "/api/v2/users", api = domain_users::ApiDoc),
        (path = "/api/v2/categories", api = domain_catalog::categories::ApiDoc),
        (path = "/api/v2", api = domain_catalog::sub_categories::ApiDoc),
        (path = "/api/v2", api = domain_catalog::products::ApiDoc)
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme the protected routes refer to.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(Http::builder().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_mounted_under_api_v2() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/v2/auth/login",
            "/api/v2/users/{id}",
            "/api/v2/categories/{id}",
            "/api/v2/categories/{id}/bookcategories",
            "/api/v2/bookcategories/{id}/books",
            "/api/v2/books/{id}",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert!(doc.components.unwrap().security_schemes.contains_key("bearer"));
    }
}
