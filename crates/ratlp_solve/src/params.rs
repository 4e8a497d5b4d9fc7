use num_traits::Zero;
use ratlp_num::LpScalar;

use crate::error::LpError;

/// Integer-valued solver parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    PrimalPricing,
    DualPricing,
    SimplexDisplay,
    SimplexMaxIterations,
    SimplexScaling,
}

/// Numeric solver parameters, carried in the LP's own flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumParam {
    SimplexMaxTime,
    ObjUlim,
    ObjLlim,
}

/// Parameter block of an LP. Copies between flavors convert the numeric
/// entries through the scalar conversions; integer entries copy verbatim.
#[derive(Debug, Clone)]
pub struct SolverParams<R: LpScalar> {
    pub primal_pricing: i32,
    pub dual_pricing: i32,
    pub simplex_display: i32,
    pub simplex_max_iterations: i32,
    pub simplex_scaling: i32,
    /// Wall-clock cap for one simplex run, in seconds.
    pub simplex_max_time: R,
    pub obj_ulim: R,
    pub obj_llim: R,
}

impl<R: LpScalar> Default for SolverParams<R> {
    fn default() -> Self {
        Self {
            primal_pricing: 0,
            dual_pricing: 0,
            simplex_display: 0,
            simplex_max_iterations: i32::MAX,
            simplex_scaling: 0,
            simplex_max_time: R::infinite_bound(),
            obj_ulim: R::infinite_bound(),
            obj_llim: R::zero() - R::infinite_bound(),
        }
    }
}

impl<R: LpScalar> SolverParams<R> {
    pub fn get(&self, key: Param) -> i32 {
        match key {
            Param::PrimalPricing => self.primal_pricing,
            Param::DualPricing => self.dual_pricing,
            Param::SimplexDisplay => self.simplex_display,
            Param::SimplexMaxIterations => self.simplex_max_iterations,
            Param::SimplexScaling => self.simplex_scaling,
        }
    }

    pub fn set(&mut self, key: Param, value: i32) -> Result<(), LpError> {
        match key {
            Param::PrimalPricing => self.primal_pricing = value,
            Param::DualPricing => self.dual_pricing = value,
            Param::SimplexDisplay => {
                if !(0..=1).contains(&value) {
                    return Err(LpError::Param {
                        param: "SIMPLEX_DISPLAY",
                        value: value.into(),
                    });
                }
                self.simplex_display = value;
            }
            Param::SimplexMaxIterations => {
                if value < 0 {
                    return Err(LpError::Param {
                        param: "SIMPLEX_MAX_ITERATIONS",
                        value: value.into(),
                    });
                }
                self.simplex_max_iterations = value;
            }
            Param::SimplexScaling => {
                if !(0..=1).contains(&value) {
                    return Err(LpError::Param {
                        param: "SIMPLEX_SCALING",
                        value: value.into(),
                    });
                }
                self.simplex_scaling = value;
            }
        }
        Ok(())
    }

    pub fn get_num(&self, key: NumParam) -> R {
        match key {
            NumParam::SimplexMaxTime => self.simplex_max_time.clone(),
            NumParam::ObjUlim => self.obj_ulim.clone(),
            NumParam::ObjLlim => self.obj_llim.clone(),
        }
    }

    pub fn set_num(&mut self, key: NumParam, value: R) {
        match key {
            NumParam::SimplexMaxTime => self.simplex_max_time = value,
            NumParam::ObjUlim => self.obj_ulim = value,
            NumParam::ObjLlim => self.obj_llim = value,
        }
    }

    /// Convert the whole block to another flavor, numeric entries rounding
    /// to the target precision.
    pub fn convert<S: LpScalar>(&self) -> SolverParams<S> {
        SolverParams {
            primal_pricing: self.primal_pricing,
            dual_pricing: self.dual_pricing,
            simplex_display: self.simplex_display,
            simplex_max_iterations: self.simplex_max_iterations,
            simplex_scaling: self.simplex_scaling,
            simplex_max_time: S::from_rational(&self.simplex_max_time.to_rational()),
            obj_ulim: S::from_rational(&self.obj_ulim.to_rational()),
            obj_llim: S::from_rational(&self.obj_llim.to_rational()),
        }
    }
}
