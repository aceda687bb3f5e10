use biosentinel::{
    core::{
        attacks::{AttackKind, SecurityPosture},
        identity::{biometric, Role},
        services::VerificationRequest,
    },
    utils::config::Config,
    BiometricEngine,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .init();

    info!("Starting Biosentinel v{}", env!("CARGO_PKG_VERSION"));

    let postures = match std::env::args().nth(1) {
        Some(arg) => vec![arg.parse::<SecurityPosture>()?],
        None => vec![SecurityPosture::Baseline, SecurityPosture::Hardened],
    };

    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let engine = BiometricEngine::new(config)?;
    let monitor = engine.monitor().start();

    let victim = engine.register_identity("alice", Role::Admin).await?;
    let template = engine.enroll(victim.id, None).await?;
    let engineer = engine.register_identity("bob", Role::SecurityEngineer).await?;
    engine.enroll(engineer.id, None).await?;

    let client_ip = engine.config().engine.default_client_ip.clone();
    let genuine = engine
        .verify(VerificationRequest::new(victim.id, Some(template.embedding.clone()), client_ip))
        .await;
    info!(success = genuine.success, score = genuine.similarity_score, "Genuine verification");

    let mut report = Vec::new();
    for posture in postures {
        // Brute force last: it exhausts the attacker's rate-limit budget.
        let mut kinds: Vec<AttackKind> = AttackKind::ALL
            .into_iter()
            .filter(|kind| *kind != AttackKind::BruteForce)
            .collect();
        kinds.push(AttackKind::BruteForce);

        for kind in kinds {
            if kind == AttackKind::Replay {
                let observed = jitter(&template.embedding);
                engine.capture_traffic(victim.id, observed);
            }

            let outcome = engine.run_attack_scenario(kind, victim.id, posture).await;
            report.push(serde_json::json!({
                "attack": kind,
                "posture": posture,
                "success": outcome.success,
                "blocked": outcome.blocked,
                "message": outcome.message,
            }));
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("{}", serde_json::to_string_pretty(&engine.get_metrics())?);
    println!("{}", serde_json::to_string_pretty(&engine.audit_summary())?);

    monitor.abort();
    info!("Simulation complete");
    Ok(())
}

/// Sensor noise on top of a genuine capture.
fn jitter(embedding: &[f64]) -> Vec<f64> {
    let noise = biometric::synthesize_embedding(embedding.len());
    embedding
        .iter()
        .zip(noise)
        .map(|(value, n)| value + n * 0.01)
        .collect()
}
