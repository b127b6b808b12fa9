//! # Tiger 핵심 모듈
//!
//! 스케줄 평가, 파라미터 분류, 업데이트 커널로 구성된 갱신 엔진

pub mod optimizers;

// 주요 타입들 재수출
pub use optimizers::*;
