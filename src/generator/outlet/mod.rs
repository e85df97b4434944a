use crate::generator::context::GeneratorContext;
use crate::generator::research::types::ReportData;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 文件名中slug部分的最大长度
const MAX_SLUG_LEN: usize = 48;

/// 保存最终报告
pub async fn save_report(
    context: &GeneratorContext,
    query: &str,
    report: &ReportData,
) -> Result<PathBuf> {
    let outlet = DiskOutlet::new(&context.config.output_path);
    outlet.save(query, report).await
}

pub trait Outlet {
    async fn save(&self, query: &str, report: &ReportData) -> Result<PathBuf>;
}

pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// `<时间戳>-<slug>.md`
    pub fn file_name(query: &str, timestamp: &chrono::DateTime<chrono::Local>) -> String {
        format!("{}-{}.md", timestamp.format("%Y%m%d-%H%M%S"), slugify(query))
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, query: &str, report: &ReportData) -> Result<PathBuf> {
        println!("\n🖊️ 报告存储中...");
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory: {:?}", self.output_dir)
        })?;

        let file_name = Self::file_name(query, &chrono::Local::now());
        let mut output_file_path = self.output_dir.join(&file_name);

        // 同一秒内重复保存时追加序号
        let mut suffix = 1;
        while output_file_path.exists() {
            suffix += 1;
            let stem = file_name.trim_end_matches(".md");
            output_file_path = self.output_dir.join(format!("{}-{}.md", stem, suffix));
        }

        fs::write(&output_file_path, render_report(query, report))
            .with_context(|| format!("Failed to write report: {:?}", output_file_path))?;

        println!("💾 已保存报告: {}", output_file_path.display());
        tracing::info!(path = %output_file_path.display(), "report saved");
        Ok(output_file_path)
    }
}

/// 渲染落盘的markdown文档
pub fn render_report(query: &str, report: &ReportData) -> String {
    let mut doc = format!("<!-- query: {} -->\n\n", query.replace("--", "- -"));
    doc.push_str(report.markdown_report.trim_end());
    doc.push_str("\n\n---\n\n## Summary\n\n");
    doc.push_str(report.short_summary.trim());
    doc.push('\n');

    if !report.follow_up_questions.is_empty() {
        doc.push_str("\n## Follow-up Questions\n\n");
        for question in &report.follow_up_questions {
            doc.push_str(&format!("- {}\n", question));
        }
    }
    doc
}

/// 把查询文本转换为文件名友好的片段
pub fn slugify(query: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for ch in query.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
        if slug.chars().count() >= MAX_SLUG_LEN {
            break;
        }
    }

    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests;
