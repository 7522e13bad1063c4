use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_created_total: IntCounter,
    pub order_transitions_total: IntCounterVec,
    pub registrations_total: IntCounterVec,
    pub assistant_requests_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_created_total =
            IntCounter::new("orders_created_total", "Total delivery orders created")
                .expect("valid orders_created_total metric");

        let order_transitions_total = IntCounterVec::new(
            Opts::new(
                "order_transitions_total",
                "Order lifecycle transitions by transition and outcome",
            ),
            &["transition", "outcome"],
        )
        .expect("valid order_transitions_total metric");

        let registrations_total = IntCounterVec::new(
            Opts::new("registrations_total", "Successful registrations by role"),
            &["role"],
        )
        .expect("valid registrations_total metric");

        let assistant_requests_total = IntCounterVec::new(
            Opts::new(
                "assistant_requests_total",
                "Assistant calls by kind and outcome",
            ),
            &["kind", "outcome"],
        )
        .expect("valid assistant_requests_total metric");

        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(order_transitions_total.clone()))
            .expect("register order_transitions_total");
        registry
            .register(Box::new(registrations_total.clone()))
            .expect("register registrations_total");
        registry
            .register(Box::new(assistant_requests_total.clone()))
            .expect("register assistant_requests_total");

        Self {
            registry,
            orders_created_total,
            order_transitions_total,
            registrations_total,
            assistant_requests_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
