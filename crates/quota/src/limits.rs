use postforge_core::PlanTier;
use serde::Serialize;

/// Generation allowance for a plan. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlanLimits {
    pub plan: PlanTier,
    pub daily: Option<u32>,
    pub monthly: Option<u32>,
}

impl PlanLimits {
    pub fn for_plan(plan: PlanTier) -> Self {
        match plan {
            PlanTier::Free => Self { plan, daily: Some(3), monthly: Some(10) },
            PlanTier::Pro => Self { plan, daily: Some(25), monthly: Some(300) },
            PlanTier::Business => Self { plan, daily: None, monthly: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_increasingly_generous() {
        let free = PlanLimits::for_plan(PlanTier::Free);
        let pro = PlanLimits::for_plan(PlanTier::Pro);
        assert!(free.daily < pro.daily);
        assert!(free.monthly < pro.monthly);
        let business = PlanLimits::for_plan(PlanTier::Business);
        assert_eq!((business.daily, business.monthly), (None, None));
    }

    #[test]
    fn daily_never_exceeds_monthly() {
        for plan in [PlanTier::Free, PlanTier::Pro] {
            let l = PlanLimits::for_plan(plan);
            assert!(l.daily.unwrap() <= l.monthly.unwrap());
        }
    }
}
