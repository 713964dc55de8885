//! CLI smoke entry point.
//!
//! # Responsibility
//! - Run one deterministic mount/resize/unmount session on the in-memory host.
//! - Print the registry snapshot as JSON after each step.
//!
//! Usage: `responsive_scope_cli [absolute-log-dir]`

use responsive_scope_core::{
    core_version, default_log_level, init_logging, MemoryHost, ScopeConfig, ScopeContext,
    ScopeFragment,
};
use std::error::Error;
use std::rc::Rc;

fn main() -> Result<(), Box<dyn Error>> {
    println!("responsive_scope_core version={}", core_version());
    if let Some(log_dir) = std::env::args().nth(1) {
        init_logging(default_log_level(), &log_dir)?;
    }

    let host = Rc::new(MemoryHost::new(375, 812));
    let context = ScopeContext::new(host.clone(), ScopeConfig::default())?;

    let fragment = Rc::new(
        ScopeFragment::with_declaration("{ open: false, title: \"demo\" }")
            .props(r#"{"type":"demo card","id":"demo","script":"init()"}"#),
    );
    host.attach(&fragment);
    let report = context.mount(&fragment);
    println!(
        "mounted instance_id={} data_key={} fallback={} script={}",
        report.instance_id,
        report.data_key,
        report.merge.is_fallback(),
        report.props.script.as_deref().unwrap_or("none")
    );
    println!("after_mount={}", serde_json::to_string(&context.instances_info())?);

    host.resize_window(1440, 900);
    let delivery = context.on_resize();
    let breakpoint = fragment
        .state()
        .map(|state| state.breakpoint().as_str())
        .unwrap_or("none");
    println!("resized delivered={} breakpoint={breakpoint}", delivery.delivered);

    context.unmount(&fragment);
    host.detach(&fragment);
    println!("after_unmount={}", serde_json::to_string(&context.instances_info())?);

    context.destroy_all_instances();
    println!("after_teardown={}", serde_json::to_string(&context.instances_info())?);
    Ok(())
}
