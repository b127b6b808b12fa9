use super::super::config::TigerConfig;
use super::super::schedule::StepCoefficients;

#[test]
fn 기본_구성_테스트() {
    let config = TigerConfig::default();

    assert_eq!(config.learning_rate, 1e-3);
    assert_eq!(config.beta, 0.965);
    assert_eq!(config.weight_decay, 0.01);
    assert_eq!(config.grad_accum_steps, 1);
    assert_eq!(config.lr_schedule.get(&0), Some(&1.0));
    assert_eq!(config.shrink_ratio, 0.99);
    assert!(config.validate().is_ok());

    println!("✅ 기본 구성 테스트 통과");
}

#[test]
fn 구성_검증_실패_테스트() {
    // 잘못된 값은 보정 없이 생성 시점에 거부된다
    assert!(TigerConfig::new().with_learning_rate(0.0).validate().is_err());
    assert!(TigerConfig::new().with_learning_rate(-1.0).validate().is_err());
    assert!(TigerConfig::new().with_beta(0.0).validate().is_err());
    assert!(TigerConfig::new().with_beta(1.0).validate().is_err());
    assert!(TigerConfig::new().with_beta(1.5).validate().is_err());
    assert!(TigerConfig::new().with_weight_decay(-0.1).validate().is_err());
    assert!(TigerConfig::new().with_grad_accum_steps(0).validate().is_err());
    assert!(TigerConfig::new().with_lr_schedule([]).validate().is_err());
    assert!(TigerConfig::new().with_lr_schedule([(0, -1.0)]).validate().is_err());
    assert!(TigerConfig::new().with_shrink_ratio(0.0).validate().is_err());
    assert!(TigerConfig::new().with_shrink_ratio(1.0).validate().is_err());
    assert!(TigerConfig::new().with_beta(f32::NAN).validate().is_err());

    println!("✅ 구성 검증 실패 테스트 통과");
}

#[test]
fn 스냅샷_왕복_테스트() {
    let config = TigerConfig::new()
        .with_learning_rate(2e-4)
        .with_beta(0.95)
        .with_weight_decay(0.02)
        .with_grad_accum_steps(4)
        .with_lr_schedule([(1000, 1.0), (2000, 0.1)])
        .with_shrink_ratio(0.995);

    // 스냅샷은 평범한 키-값 쌍이며 파생 상태가 없다
    let snapshot = serde_json::to_string(&config).unwrap();
    let restored: TigerConfig = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(config, restored);

    // 복원된 구성은 같은 스텝 수열에 대해 동일한 학습률을 재현한다
    for t in 0..4000u64 {
        let lhs = StepCoefficients::evaluate(&config, t);
        let rhs = StepCoefficients::evaluate(&restored, t);
        assert_eq!(lhs.lr, rhs.lr, "t={}에서 학습률이 달라짐", t);
        assert_eq!(lhs.b1, rhs.b1);
        assert_eq!(lhs.b2, rhs.b2);
    }

    println!("✅ 스냅샷 왕복 테스트 통과");
}
