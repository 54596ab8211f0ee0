// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use opentelemetry::metrics::{Counter, Meter};

const FETCHER_EVENT_COUNT_NAME: &str = "fetcher.event.count";

pub(crate) fn create_event_counter(meter: &Meter) -> Counter<u64> {
    meter
        .u64_counter(FETCHER_EVENT_COUNT_NAME)
        .with_description("Fetch coordinator events")
        .with_unit("{event}")
        .build()
}
