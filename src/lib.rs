//! Tiger 옵티마이저 라이브러리
//!
//! 모멘텀과 가중치 감쇠만으로 파라미터를 갱신하는 sign-momentum 옵티마이저.
//! 별도의 캐시 텐서 없이 모멘텀 슬롯 하나로 그래디언트 누적까지 처리하므로
//! 누적 학습이 필요한 경우 메모리 측면에서 최적이다.
//!
//! Lion/SignSGD 계열에서 출발해 하이퍼파라미터를 단순화(beta1=beta2)하고
//! LAMB 방식의 적응형 학습률과 NaN 발산 방지 전략을 추가했다.

pub mod core;

// 핵심 타입들 재수출
pub use crate::core::optimizers::{
    piecewise_linear, root_mean_square, Gradient, ParamRole, Parameter, StepCoefficients,
    TigerConfig, TigerOptimizer,
};

// 편의 타입 별칭
pub type Tiger = TigerOptimizer;
