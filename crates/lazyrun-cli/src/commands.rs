//! Subcommand handlers. Each prints its own success message; errors are
//! turned into messages by `main`.

use lazyrun_core::Result;
use lazyrun_store::{CommandRunner, RunMode, RunOutcome, RunReport, ShortcutStore};

/// Prints each command before handing it to the inner runner.
pub struct Announcing<R>(pub R);

impl<R: CommandRunner> CommandRunner for Announcing<R> {
    fn run(&self, cmd: &str, mode: RunMode) -> std::io::Result<RunOutcome> {
        match mode {
            RunMode::Wait => println!("▶ | Running command: {cmd}"),
            RunMode::Detach => println!("▶ | Launching command: {cmd}"),
        }
        self.0.run(cmd, mode)
    }
}

pub fn save(store: &ShortcutStore, name: &str, cmd: &str) -> Result<()> {
    store.set_shortcut(name, cmd)?;
    println!("✔ | Shortcut saved. '{name}' → {cmd}");
    Ok(())
}

pub fn list(store: &ShortcutStore, json: bool) -> Result<()> {
    let shortcuts = store.get_all()?;
    if json {
        let out = serde_json::to_string_pretty(&shortcuts)
            .map_err(|e| lazyrun_core::LazyrunError::Serialization(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    if shortcuts.is_empty() {
        println!("No shortcuts saved.");
        return Ok(());
    }
    println!("Saved shortcuts:");
    for (name, entry) in &shortcuts {
        if entry.tags.is_empty() {
            println!("  {name}: {}", entry.cmd);
        } else {
            println!("  {name}: {}  [{}]", entry.cmd, entry.tags.join(", "));
        }
    }
    Ok(())
}

pub fn remove(store: &ShortcutStore, name: &str) -> Result<()> {
    if store.delete_shortcut(name)? {
        println!("✔ | Shortcut '{name}' removed.");
    } else {
        println!("✘ | No shortcut found with the name '{name}'.");
    }
    Ok(())
}

pub fn tag_add(store: &ShortcutStore, name: &str, tag: &str) -> Result<()> {
    if store.add_tag(name, tag)? {
        println!("✔ | Tagged '{name}' with '{tag}'.");
    } else {
        println!("'{name}' is already tagged '{tag}'.");
    }
    Ok(())
}

pub fn tag_remove(store: &ShortcutStore, name: &str, tag: &str) -> Result<()> {
    store.remove_tag(name, tag)?;
    println!("✔ | Removed tag '{tag}' from '{name}'.");
    Ok(())
}

pub fn tag_list(store: &ShortcutStore, name: &str) -> Result<()> {
    let tags = store.list_tags(name)?;
    if tags.is_empty() {
        println!("No tags on '{name}'.");
    } else {
        for tag in tags {
            println!("{tag}");
        }
    }
    Ok(())
}

pub fn tag_run(
    store: &ShortcutStore,
    tag: &str,
    wait: bool,
    runner: &dyn CommandRunner,
) -> Result<()> {
    let reports = store.run_by_tag(tag, wait, runner)?;
    if reports.is_empty() {
        println!("No shortcuts tagged '{tag}'.");
    }
    print_failures(&reports);
    Ok(())
}

pub fn group_add(
    store: &ShortcutStore,
    name: &str,
    group: &str,
    priority: Option<i64>,
) -> Result<()> {
    if store.add_to_group(name, group, priority)? {
        println!("✔ | Added '{name}' to group '{group}'.");
    } else {
        println!("'{name}' is already in group '{group}'.");
    }
    Ok(())
}

pub fn group_remove(store: &ShortcutStore, name: &str, group: &str) -> Result<()> {
    store.remove_from_group(name, group)?;
    println!("✔ | Removed '{name}' from group '{group}'.");
    Ok(())
}

pub fn group_list(store: &ShortcutStore, group: Option<&str>) -> Result<()> {
    match group {
        Some(group) => {
            let members = store.list_group_members(group)?;
            if members.is_empty() {
                println!("Group '{group}' has no members.");
            }
            for (position, name) in members.iter().enumerate() {
                println!("{position}. {name}");
            }
        }
        None => {
            let groups = store.list_groups()?;
            if groups.is_empty() {
                println!("No groups defined.");
            }
            for (group, members) in groups {
                println!("  {group}: {}", members.join(" → "));
            }
        }
    }
    Ok(())
}

pub fn group_run(store: &ShortcutStore, group: &str, runner: &dyn CommandRunner) -> Result<()> {
    let reports = store.run_by_group(group, runner)?;
    if reports.is_empty() {
        println!("Group '{group}' has no members.");
    }
    print_failures(&reports);
    Ok(())
}

pub fn run_shortcut(store: &ShortcutStore, name: &str, runner: &dyn CommandRunner) -> Result<()> {
    let report = store.run_shortcut(name, runner)?;
    print_failures(std::slice::from_ref(&report));
    Ok(())
}

fn print_failures(reports: &[RunReport]) {
    for report in reports {
        match &report.outcome {
            RunOutcome::Exited(Some(0)) | RunOutcome::Detached => {}
            RunOutcome::Exited(Some(code)) => {
                eprintln!("✘ | '{}' exited with status {code}.", report.name);
            }
            RunOutcome::Exited(None) => {
                eprintln!("✘ | '{}' was terminated by a signal.", report.name);
            }
            RunOutcome::Failed(reason) => {
                eprintln!("✘ | '{}' could not be started: {reason}", report.name);
            }
        }
    }
}
