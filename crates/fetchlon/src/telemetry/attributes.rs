// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
pub(crate) const FETCHER_NAME: &str = "fetcher.name";

#[cfg(any(feature = "metrics", test))]
pub(crate) const FETCHER_ACTIVITY: &str = "fetcher.activity";

#[cfg(test)]
pub(crate) const FETCHER_REQUEST_ID: &str = "fetcher.request_id";

#[cfg(test)]
pub(crate) const FETCHER_EVENT: &str = "fetcher.event";
