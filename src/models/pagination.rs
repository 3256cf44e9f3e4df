// src/models/pagination.rs
use serde::{Deserialize, Serialize};

const MAX_ITEMS_PER_PAGE: u32 = 100;

/// Query string comum às listagens: `page`, `itemsPerPage` e `noPagination`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub items_per_page: Option<u32>,
    pub no_pagination: Option<String>,
}

/// Janela já resolvida (página >= 1, tamanho entre 1 e o máximo).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl PaginationParams {
    /// `None` quando o cliente pediu a lista completa.
    pub fn resolve(&self, default_per_page: u32) -> Option<PageRequest> {
        let unpaged = self
            .no_pagination
            .as_deref()
            .map(|v| !matches!(v.trim(), "" | "0" | "false"))
            .unwrap_or(false);
        if unpaged {
            return None;
        }
        Some(PageRequest {
            page: self.page.unwrap_or(1).max(1),
            per_page: self
                .items_per_page
                .unwrap_or(default_per_page)
                .clamp(1, MAX_ITEMS_PER_PAGE),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
    pub first_page: u32,
}

impl PageMeta {
    pub fn new(total: i64, request: PageRequest) -> Self {
        let per_page = i64::from(request.per_page);
        let last_page = ((total + per_page - 1) / per_page).max(1);
        PageMeta {
            total,
            per_page: request.per_page,
            current_page: request.page,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
            first_page: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub meta: PageMeta,
    pub data: Vec<T>,
}

/// Lista completa ou paginada, conforme o pedido.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Listing<T> {
    All(Vec<T>),
    Paged(Page<T>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_missing() {
        let request = PaginationParams::default().resolve(10).unwrap();
        assert_eq!(request, PageRequest { page: 1, per_page: 10 });
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn page_zero_and_oversized_pages_are_clamped() {
        let params = PaginationParams {
            page: Some(0),
            items_per_page: Some(10_000),
            no_pagination: None,
        };
        let request = params.resolve(2).unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, MAX_ITEMS_PER_PAGE);
    }

    #[test]
    fn no_pagination_flag() {
        let mut params = PaginationParams {
            no_pagination: Some("true".into()),
            ..Default::default()
        };
        assert!(params.resolve(10).is_none());
        params.no_pagination = Some("false".into());
        assert!(params.resolve(10).is_some());
    }

    #[test]
    fn last_page_rounds_up() {
        let request = PageRequest { page: 3, per_page: 2 };
        assert_eq!(request.offset(), 4);
        assert_eq!(PageMeta::new(5, request).last_page, 3);
        assert_eq!(PageMeta::new(0, request).last_page, 1);
    }
}
