//! Tiger 갱신 엔진
//!
//! 스텝마다 공유 계수를 한 번 계산하고(schedule), 파라미터 이름에 따라
//! 학습률/감쇠를 조정한 뒤(classifier), sign-momentum 갱신을 적용한다(tiger).

pub mod classifier;
pub mod config;
pub mod schedule;
pub mod tiger;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

// 재수출
pub use classifier::{root_mean_square, root_mean_square_keepdim_last, LrScale, ParamRole};
pub use config::TigerConfig;
pub use schedule::{piecewise_linear, StepCoefficients};
pub use tiger::{Gradient, Parameter, TigerOptimizer};
