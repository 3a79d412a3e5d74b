use std::sync::Arc;

use shared_event_bus::MemoryEventBus;

use crate::interpreter::CommandInterpreter;
use crate::patterns::MemoryPatternPersistence;
use crate::telemetry::InterpreterTelemetry;

/// Builds an interpreter and runs a handful of commands end-to-end.
pub async fn orchestrate_sample() -> anyhow::Result<()> {
    let bus = Arc::new(MemoryEventBus::new(64));
    let telemetry = InterpreterTelemetry::builder("interpreter")
        .event_publisher(bus.clone())
        .build()?;
    let interpreter = CommandInterpreter::builder()
        .persistence(Arc::new(MemoryPatternPersistence::new()))
        .telemetry(telemetry)
        .build();

    for text in [
        "hello",
        "open whatsapp",
        "remind me to call mom at 5 pm",
        "call 9876543210",
        "open whatsapp",
    ] {
        let result = interpreter.interpret("sample-user", text);
        println!("{} -> {} ({})", text, result.action, result.response);
    }

    println!("events recorded: {}", bus.snapshot().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn sample_orchestration_completes() {
        orchestrate_sample().await.unwrap();
    }
}
