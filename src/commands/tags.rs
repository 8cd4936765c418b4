use anyhow::Result;

use crate::tags::TargetProfile;

use super::FinderOptions;

/// Print the supported tags for the target interpreter, most preferred first.
pub fn tags(options: &FinderOptions, limit: Option<usize>, json: bool) -> Result<()> {
    let target = options.target()?;
    println!("{}", render(&target, limit, json)?);
    Ok(())
}

fn render(target: &TargetProfile, limit: Option<usize>, json: bool) -> Result<String> {
    let limit = limit.unwrap_or(usize::MAX);
    let tags: Vec<_> = target.supported_tags().iter().take(limit).collect();

    if json {
        return Ok(serde_json::to_string_pretty(&tags)?);
    }
    Ok(tags
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n"))
}
