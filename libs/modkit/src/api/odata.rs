use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use odata_core::{Error as ODataError, ODataPaging, PageLimits, MAX_FILTER_LEN};

pub mod error;
pub use error::odata_error_to_problem;

/// Raw OData system query options.
///
/// Paging options are kept as text: malformed values are not a client error,
/// they fall back to defaults in [`ODataParams::paging`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataParams {
    pub filter: Option<String>,
    pub orderby: Option<String>,
    pub skip: Option<String>,
    pub top: Option<String>,
    pub count: Option<String>,
}

impl ODataParams {
    /// Collect the system options from decoded query pairs. A repeated option
    /// keeps its first value; unrelated keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "$filter" => &mut params.filter,
                "$orderby" => &mut params.orderby,
                "$skip" => &mut params.skip,
                "$top" => &mut params.top,
                "$count" => &mut params.count,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }

    pub fn filter(&self) -> &str {
        self.filter.as_deref().unwrap_or_default()
    }

    pub fn orderby(&self) -> &str {
        self.orderby.as_deref().unwrap_or_default()
    }

    pub fn paging(&self, limits: PageLimits) -> ODataPaging {
        ODataPaging::parse(
            self.skip.as_deref(),
            self.top.as_deref(),
            self.count.as_deref(),
            limits,
        )
    }
}

/// Read OData options from the query string.
///
/// A query string that cannot be decoded is a 400, so a `$filter` is never
/// dropped silently. Only the `$filter` size budget is enforced here;
/// translation against allow-lists is up to the owning module.
pub async fn extract_odata_params<S>(
    parts: &mut Parts,
    state: &S,
) -> Result<ODataParams, crate::api::problem::ProblemResponse>
where
    S: Send + Sync,
{
    let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
        .await
        .map_err(|e| {
            odata_error_to_problem(
                &ODataError::InvalidFilter(format!("undecodable query string: {}", e.body_text())),
                parts.uri.path(),
            )
        })?;
    let params = ODataParams::from_pairs(pairs);

    if params.filter().len() > MAX_FILTER_LEN {
        return Err(odata_error_to_problem(
            &ODataError::InvalidFilter("filter too long".into()),
            parts.uri.path(),
        ));
    }

    Ok(params)
}

/// Axum extractor for OData query options.
///
/// ```rust,ignore
/// async fn list(OData(params): OData) { /* params.filter(), params.paging(..) */ }
/// ```
#[derive(Debug, Clone)]
pub struct OData(pub ODataParams);

impl std::ops::Deref for OData {
    type Target = ODataParams;
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for OData
where
    S: Send + Sync,
{
    type Rejection = crate::api::problem::ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        extract_odata_params(parts, state).await.map(OData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(uri: &str) -> Result<ODataParams, crate::api::problem::ProblemResponse> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        extract_odata_params(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_all_options() {
        let p = extract(
            "/odata/FoundItems?$filter=item_status%20eq%20%27available%27&$orderby=item_name%20asc&$skip=5&$top=500&$count=true",
        )
        .await
        .unwrap();

        assert_eq!(p.filter(), "item_status eq 'available'");
        assert_eq!(p.orderby(), "item_name asc");
        let paging = p.paging(PageLimits::default());
        assert_eq!(paging.skip, 5);
        assert_eq!(paging.top, 100);
        assert!(paging.count);
    }

    #[tokio::test]
    async fn encoded_dollar_keys_are_accepted() {
        let p = extract("/odata/FoundItems?%24top=3").await.unwrap();
        assert_eq!(p.paging(PageLimits::default()).top, 3);
    }

    #[tokio::test]
    async fn missing_options_use_defaults() {
        let p = extract("/odata/FoundItems").await.unwrap();
        assert_eq!(p.filter(), "");
        assert_eq!(p.orderby(), "");
        assert_eq!(p.paging(PageLimits::default()), ODataPaging::default());
    }

    #[tokio::test]
    async fn malformed_paging_is_not_an_error() {
        let p = extract("/odata/FoundItems?$skip=-4&$top=lots&$count=maybe")
            .await
            .unwrap();
        let paging = p.paging(PageLimits::default());
        assert_eq!((paging.skip, paging.top, paging.count), (0, 50, false));
    }

    #[tokio::test]
    async fn repeated_options_keep_the_first_value() {
        let p = extract(
            "/odata/FoundItems?$top=1&$top=2&$filter=item_name%20eq%20%27nope%27&$filter=x",
        )
        .await
        .unwrap();
        assert_eq!(p.filter(), "item_name eq 'nope'");
        assert_eq!(p.paging(PageLimits::default()).top, 1);
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        let p = ODataParams::from_pairs([
            ("page".to_owned(), "2".to_owned()),
            ("$count".to_owned(), "true".to_owned()),
        ]);
        assert_eq!(
            p,
            ODataParams {
                count: Some("true".into()),
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn oversized_filter_is_rejected() {
        let long = "a".repeat(MAX_FILTER_LEN + 1);
        let err = extract(&format!("/odata/FoundItems?$filter={long}"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.0.code, "ODATA_FILTER_INVALID");
        assert_eq!(err.0.instance, "/odata/FoundItems");
    }
}
