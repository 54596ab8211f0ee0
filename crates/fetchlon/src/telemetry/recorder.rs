// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Meter},
};
use tracing::Level;

#[cfg(any(feature = "metrics", test))]
use crate::telemetry::{attributes, metrics::create_event_counter};
use crate::{response::RequestId, telemetry::FetchActivity};

/// Records coordinator activities for one fetcher.
#[derive(Clone, Debug)]
pub(crate) struct FetcherTelemetry {
    name: Arc<str>,
    #[cfg(any(feature = "metrics", test))]
    event_counter: Option<Counter<u64>>,
}

impl FetcherTelemetry {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            #[cfg(any(feature = "metrics", test))]
            event_counter: None,
        }
    }

    #[cfg(any(feature = "metrics", test))]
    pub fn with_meter(mut self, meter: &Meter) -> Self {
        self.event_counter = Some(create_event_counter(meter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record(&self, activity: FetchActivity, request_id: RequestId) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(counter) = &self.event_counter {
            counter.add(
                1,
                &[
                    KeyValue::new(attributes::FETCHER_NAME, self.name.to_string()),
                    KeyValue::new(attributes::FETCHER_ACTIVITY, activity.as_str()),
                ],
            );
        }

        Self::emit(&self.name, activity, request_id);
    }

    fn emit(name: &str, activity: FetchActivity, request_id: RequestId) {
        let activity_name = activity.as_str();

        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    fetcher.name = name,
                    fetcher.activity = activity_name,
                    fetcher.request_id = request_id,
                    "fetcher.event"
                )
            };
        }

        let level = activity.level();
        if level == Level::ERROR {
            emit_event!(error);
        } else if level == Level::WARN {
            emit_event!(warn);
        } else if level == Level::INFO {
            emit_event!(info);
        } else {
            emit_event!(debug);
        }
    }
}
