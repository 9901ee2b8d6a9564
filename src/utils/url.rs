//! Link resolution.

use url::Url;

/// Resolves an `href` found on `page_url` to an absolute URL.
///
/// Root-relative paths take the scheme and host of the page, relative paths
/// are joined to the page path, absolute URLs pass through. Fragments are
/// dropped so the same product reached through different anchors dedups.
/// Returns `None` for blank links and for schemes other than http(s)
/// (`javascript:`, `mailto:`); `file:` links are kept only on `file:` pages,
/// which is how captured catalogs are replayed.
pub fn resolve_link(page_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut resolved = page_url.join(href).ok()?;
    let allowed = match resolved.scheme() {
        "http" | "https" => true,
        "file" => page_url.scheme() == "file",
        _ => false,
    };
    if !allowed {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://shop.example/cat/").unwrap()
    }

    #[test]
    fn test_root_relative_link_uses_scheme_and_host() {
        assert_eq!(
            resolve_link(&base(), "/p/123").as_deref(),
            Some("https://shop.example/p/123")
        );
    }

    #[test]
    fn test_relative_link_joins_page_path() {
        assert_eq!(
            resolve_link(&base(), "chairs/5").as_deref(),
            Some("https://shop.example/cat/chairs/5")
        );
    }

    #[test]
    fn test_absolute_link_passes_through() {
        assert_eq!(
            resolve_link(&base(), "https://other.example/x?id=1").as_deref(),
            Some("https://other.example/x?id=1")
        );
    }

    #[test]
    fn test_fragment_dropped_and_scheme_filtered() {
        assert_eq!(
            resolve_link(&base(), "/p/1#reviews").as_deref(),
            Some("https://shop.example/p/1")
        );
        assert_eq!(resolve_link(&base(), "javascript:void(0)"), None);
        assert_eq!(resolve_link(&base(), "   "), None);
        assert_eq!(resolve_link(&base(), "#top"), None);
        assert_eq!(resolve_link(&base(), "file:///etc/passwd"), None);
    }

    #[test]
    fn test_file_links_resolve_on_file_pages() {
        let page = Url::parse("file:///fixtures/shop/catalog.html").unwrap();
        assert_eq!(
            resolve_link(&page, "product-1.html").as_deref(),
            Some("file:///fixtures/shop/product-1.html")
        );
    }
}
