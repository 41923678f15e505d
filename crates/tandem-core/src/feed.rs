//! Feed paging.
//!
//! The feed lists every user the requester has no connection record with, in
//! user creation order. Paging is offset based; the ordering key is stable,
//! so consecutive pages neither skip nor repeat a candidate as long as the
//! candidate set does not change in between.

use serde::{Deserialize, Serialize};

use crate::user::PublicProfile;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// A normalised page request: both fields are always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
  page:  u32,
  limit: u32,
}

impl Default for PageRequest {
  fn default() -> Self { Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT } }
}

impl PageRequest {
  /// Build a request from numeric input. Zero falls back to the default and
  /// `limit` is capped at [`MAX_LIMIT`].
  pub fn new(page: u32, limit: u32) -> Self {
    let page = if page == 0 { DEFAULT_PAGE } else { page };
    let limit = match limit {
      0 => DEFAULT_LIMIT,
      l => l.min(MAX_LIMIT),
    };
    Self { page, limit }
  }

  /// Build a request from raw query-string values. Anything absent or not a
  /// positive integer falls back to the default.
  pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
    let parse = |raw: Option<&str>| {
      raw.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(0)
    };
    Self::new(parse(page), parse(limit))
  }

  pub fn page(&self) -> u32 { self.page }

  pub fn limit(&self) -> u32 { self.limit }

  /// Index of the first candidate on this page.
  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1).saturating_mul(u64::from(self.limit))
  }
}

/// One page of the feed, echoing the page parameters actually applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
  pub data:  Vec<PublicProfile>,
  pub page:  u32,
  pub limit: u32,
}

impl FeedPage {
  pub fn new(request: PageRequest, data: Vec<PublicProfile>) -> Self {
    Self { data, page: request.page, limit: request.limit }
  }
}
