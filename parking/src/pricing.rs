/// Decides the next hourly cost of one edge and time bin, given how full it was compared to its
/// capacity during the last iteration. A relative occupancy of 1 means every spot was taken for the
/// whole bin.
pub trait PricingPolicy {
    fn new_cost(&self, relative_occupancy: f64, previous_cost: f64) -> f64;
}

/// Scales the cost by how full the edge was. Empty edges become free; only oversubscribed edges get
/// more expensive.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InverseLinear;

impl PricingPolicy for InverseLinear {
    fn new_cost(&self, relative_occupancy: f64, previous_cost: f64) -> f64 {
        relative_occupancy * previous_cost
    }
}

impl<F: Fn(f64, f64) -> f64> PricingPolicy for F {
    fn new_cost(&self, relative_occupancy: f64, previous_cost: f64) -> f64 {
        self(relative_occupancy, previous_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_linear() {
        assert_eq!(InverseLinear.new_cost(0.5, 5.0), 2.5);
        assert_eq!(InverseLinear.new_cost(0.0, 5.0), 0.0);
        assert_eq!(InverseLinear.new_cost(2.0, 1.5), 3.0);
        // Once free, always free
        assert_eq!(InverseLinear.new_cost(3.0, 0.0), 0.0);
    }

    #[test]
    fn closures() {
        let floor = |relative: f64, previous: f64| (relative * previous).max(1.0);
        let policy: Box<dyn PricingPolicy> = Box::new(floor);
        assert_eq!(policy.new_cost(0.1, 2.0), 1.0);
        assert_eq!(policy.new_cost(2.0, 2.0), 4.0);
    }
}
