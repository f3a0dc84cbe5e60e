//! HTTP client for the catalog and order service.
//!
//! Uses `reqwest` for HTTP. Single-product lookups are cached with `moka`;
//! every full list fetch invalidates that cache.

use std::sync::Arc;
use std::time::Duration;

use cartsync_core::{OrderRequest, Product, ProductId};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{CatalogService, OrderService, RemoteError, truncate_body};
use crate::config::{MAX_DURATION_SECS, RemoteConfig};

/// Characters of a response body kept in logs.
const LOG_BODY_CHARS: usize = 500;

/// Characters of a response body kept in error values.
const ERROR_BODY_CHARS: usize = 200;

/// Client for the remote catalog and order endpoints.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    client: reqwest::Client,
    base_url: Url,
    products: Cache<ProductId, Product>,
}

impl HttpClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let ttl = config
            .product_cache_ttl
            .min(Duration::from_secs(MAX_DURATION_SECS));
        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Ok(Self {
            inner: Arc::new(HttpClientInner {
                client,
                base_url: config.base_url.clone(),
                products,
            }),
        })
    }

    /// Build an endpoint URL under the base URL.
    ///
    /// Segments are percent-encoded; an empty final segment keeps a trailing slash.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Read a response, mapping rate limits and non-success statuses to errors.
    async fn read_body(response: reqwest::Response) -> Result<String, RemoteError> {
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(RemoteError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate_body(&body, LOG_BODY_CHARS),
                "Remote service returned non-success status"
            );
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: truncate_body(&body, ERROR_BODY_CHARS),
            });
        }

        Ok(body)
    }

    fn parse<T: DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate_body(body, LOG_BODY_CHARS),
                "Failed to parse remote response"
            );
            RemoteError::Parse(e)
        })
    }
}

impl CatalogService for HttpClient {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<Product>, RemoteError> {
        let url = self.endpoint(&["product", ""]);
        let response = self.inner.client.get(url).send().await?;
        let body = Self::read_body(response).await?;
        let products: Vec<Product> = Self::parse(&body)?;

        // The fresh list supersedes every cached lookup. It is not validated
        // yet, so it does not seed the cache.
        self.inner.products.invalidate_all();

        debug!(count = products.len(), "Fetched product list");
        Ok(products)
    }

    #[instrument(skip_all, fields(product_id = %id))]
    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, RemoteError> {
        if let Some(product) = self.inner.products.get(id).await {
            debug!("Cache hit for product");
            return Ok(Some(product));
        }

        let url = self.endpoint(&["product", id.as_str()]);
        let response = self.inner.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("Product not found");
            return Ok(None);
        }

        let body = Self::read_body(response).await?;
        let product: Product = Self::parse(&body)?;

        self.inner
            .products
            .insert(product.id.clone(), product.clone())
            .await;

        Ok(Some(product))
    }
}

impl OrderService for HttpClient {
    #[instrument(skip(self, order), fields(items = order.order_items.len()))]
    async fn submit_order(&self, order: &OrderRequest) -> Result<(), RemoteError> {
        let url = self.endpoint(&["orders"]);
        let response = self.inner.client.post(url).json(order).send().await?;

        // Body is ignored on success
        Self::read_body(response).await?;
        debug!("Order accepted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use cartsync_core::OrderItem;

    use super::*;

    const MUG: &str = r#"{"id":"3","title":"Mug","price":"9.50","stock":4}"#;

    fn client(base: &str) -> HttpClient {
        let config = RemoteConfig {
            base_url: Url::parse(base).unwrap(),
            ..RemoteConfig::default()
        };
        HttpClient::new(&config).unwrap()
    }

    fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        let extra: String = headers
            .iter()
            .map(|(name, value)| format!("{name}: {value}\r\n"))
            .collect();
        format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n{extra}\r\n{body}",
            body.len()
        )
    }

    /// Read one request, headers and body.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8(buf).unwrap()
    }

    /// Serve `responses` to one connection each, then stop listening.
    ///
    /// Returns the base URL and a handle yielding the requests received.
    async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });

        (base, handle)
    }

    #[test]
    fn test_products_endpoint_keeps_trailing_slash() {
        let c = client("http://localhost:8081");
        assert_eq!(
            c.endpoint(&["product", ""]).as_str(),
            "http://localhost:8081/product/"
        );
    }

    #[test]
    fn test_endpoint_under_base_path() {
        let c = client("https://shop.example/api/");
        assert_eq!(
            c.endpoint(&["orders"]).as_str(),
            "https://shop.example/api/orders"
        );
    }

    #[test]
    fn test_product_endpoint_encodes_id() {
        let c = client("http://localhost:8081/");
        assert_eq!(
            c.endpoint(&["product", "a b/c"]).as_str(),
            "http://localhost:8081/product/a%20b%2Fc"
        );
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = HttpClient::parse::<Vec<Product>>("{oops");
        assert!(matches!(result, Err(RemoteError::Parse(_))));
    }

    #[test]
    fn test_oversized_cache_ttl_is_capped() {
        let config = RemoteConfig {
            product_cache_ttl: Duration::from_secs(99_999_999_999),
            ..RemoteConfig::default()
        };
        assert!(HttpClient::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_products_parses_list() {
        let body = format!("[{MUG}]");
        let (base, server) = serve(vec![response("200 OK", &[], &body)]).await;

        let products = client(&base).fetch_products().await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "3");
        assert_eq!(products[0].stock, 4);
        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /product/ HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_missing_product_is_none() {
        let (base, server) = serve(vec![response("404 Not Found", &[], "")]).await;

        let product = client(&base).fetch_product(&ProductId::new("9")).await.unwrap();

        assert!(product.is_none());
        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /product/9 HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let (base, _server) = serve(vec![response(
            "429 Too Many Requests",
            &[("Retry-After", "7")],
            "slow down",
        )])
        .await;

        let result = client(&base).fetch_products().await;

        assert!(matches!(result, Err(RemoteError::RateLimited(7))));
    }

    #[tokio::test]
    async fn test_rate_limit_without_header_defaults_to_one_second() {
        let (base, _server) = serve(vec![response("429 Too Many Requests", &[], "")]).await;

        let result = client(&base).fetch_product(&ProductId::new("3")).await;

        assert!(matches!(result, Err(RemoteError::RateLimited(1))));
    }

    #[tokio::test]
    async fn test_server_error_body_is_truncated() {
        let body = "x".repeat(1000);
        let (base, _server) =
            serve(vec![response("500 Internal Server Error", &[], &body)]).await;

        let result = client(&base).fetch_products().await;

        match result {
            Err(RemoteError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body.chars().count(), ERROR_BODY_CHARS);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_order_success_ignores_body() {
        let (base, server) = serve(vec![response("201 Created", &[], "not json")]).await;
        let order = OrderRequest {
            order_items: vec![OrderItem {
                product_id: ProductId::new("3"),
                quantity: 2,
            }],
        };

        client(&base).submit_order(&order).await.unwrap();

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /orders HTTP/1.1"));
        assert!(requests[0].ends_with(r#"{"orderItems":[{"produtoId":"3","quantity":2}]}"#));
    }

    #[tokio::test]
    async fn test_rejected_order_is_status_error() {
        let (base, _server) = serve(vec![response("400 Bad Request", &[], "no stock")]).await;
        let order = OrderRequest {
            order_items: Vec::new(),
        };

        let result = client(&base).submit_order(&order).await;

        assert!(matches!(
            result,
            Err(RemoteError::Status { status: 400, ref body }) if body == "no stock"
        ));
    }

    #[tokio::test]
    async fn test_product_lookup_is_cached() {
        let (base, server) = serve(vec![response("200 OK", &[], MUG)]).await;
        let c = client(&base);

        let first = c.fetch_product(&ProductId::new("3")).await.unwrap();
        assert_eq!(server.await.unwrap().len(), 1);

        // The server is gone, so this can only come from the cache
        let second = c.fetch_product(&ProductId::new("3")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.unwrap().title, "Mug");
    }

    #[tokio::test]
    async fn test_list_fetch_clears_lookup_cache_without_seeding_it() {
        let list = r#"[{"id":"3","title":"Mug","price":"9.50","stock":1}]"#;
        let (base, server) = serve(vec![
            response("200 OK", &[], MUG),
            response("200 OK", &[], list),
        ])
        .await;
        let c = client(&base);

        c.fetch_product(&ProductId::new("3")).await.unwrap();
        let listed = c.fetch_products().await.unwrap();
        assert_eq!(listed[0].stock, 1);
        assert_eq!(server.await.unwrap().len(), 2);

        c.inner.products.run_pending_tasks().await;
        assert_eq!(c.inner.products.entry_count(), 0);

        // Neither the earlier lookup nor the list answers this one
        let result = c.fetch_product(&ProductId::new("3")).await;
        assert!(matches!(result, Err(RemoteError::Http(_))));
    }
}
