use ferroflux_frontapp::{Dispatcher, InputItem};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== Frontapp Batch Dispatch Demo ===");

    // 1. Build the dispatcher from FRONTAPP_* variables (.env is honoured)
    let dispatcher = Dispatcher::from_env()?;

    // 2. A small batch: one good item, one bad JSON field, one unknown resource
    let items = vec![
        InputItem::new()
            .with("resource", "tag")
            .with("operation", "list"),
        InputItem::new()
            .with("resource", "contact")
            .with("operation", "create")
            .with("contactData", "{not json"),
        InputItem::new()
            .with("resource", "inbox")
            .with("operation", "list"),
    ];

    // 3. One record per item, in order
    let records = dispatcher.run(&items).await;
    for (index, record) in records.iter().enumerate() {
        println!("[{}] {}", index, serde_json::to_string_pretty(record)?);
    }

    Ok(())
}
