//! # Query Types
//!
//! Read-path filters and pagination for contract and shipment listings.

use serde::{Deserialize, Serialize};

use crate::entities::{Contract, ContractKey, Shipment, ShipmentStatus};
use crate::status::ContractStatus;

/// Default page size for listings.
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Hard cap on page size.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Offset/limit pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Apply to an already-filtered, already-sorted collection.
    pub fn apply<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let limit = self.limit.clamp(1, MAX_PAGE_LIMIT);
        let items = items.into_iter().skip(self.offset).take(limit).collect();
        Page {
            items,
            total,
            offset: self.offset,
            limit,
        }
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }
}

/// Contract listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractQuery {
    pub status: Option<ContractStatus>,
    pub locked: Option<bool>,
    pub page: Pagination,
}

impl ContractQuery {
    pub fn matches(&self, contract: &Contract) -> bool {
        self.status.map_or(true, |s| contract.status() == s)
            && self.locked.map_or(true, |l| contract.is_locked == l)
    }
}

/// Shipment listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentQuery {
    pub contract_key: Option<ContractKey>,
    pub status: Option<ShipmentStatus>,
    pub page: Pagination,
}

impl ShipmentQuery {
    pub fn for_contract(key: ContractKey) -> Self {
        Self {
            contract_key: Some(key),
            ..Self::default()
        }
    }

    pub fn matches(&self, shipment: &Shipment) -> bool {
        self.contract_key
            .as_ref()
            .map_or(true, |k| &shipment.contract_key == k)
            && self.status.map_or(true, |s| shipment.status == s)
    }
}
