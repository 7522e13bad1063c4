use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminStatistics {
    pub total_customers: usize,
    pub total_riders: usize,
    pub total_orders: usize,
    pub total_revenue: f64,
}
