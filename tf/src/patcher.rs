//! Project file patcher
//!
//! Rewrites the text of a generated `.csproj` so Visual Studio treats `.tt`
//! files as preprocessed text templates with a known generated output, and so
//! the project runs the text transformation on build.
//!
//! Matching is literal and line-oriented. Each tag is expected on a single
//! line in the shape the IDE generates; no XML parsing is attempted.

use regex::Regex;
use tracing::debug;

use crate::error::Result;

const TEMPLATE_EXTENSION: &str = ".tt";
const CS_EXTENSION: &str = ".cs";

/// `<None Include="X.tt" />` entries emitted for template sources
const TEMPLATE_PATTERN: &str = r#"<None Include="(?P<path>[^"]+\.tt)" />"#;

/// Compiler targets import, optionally followed by the text templating import
const BUILD_IMPORT_PATTERN: &str = concat!(
    r#"(?s)<Import Project="\$\(MSBuildToolsPath\)\\Microsoft\.CSharp\.targets" />"#,
    r#"(?:.*<Import Project="\$\(VSToolsPath\)\\TextTemplating\\Microsoft\.TextTemplating\.targets" />)?"#,
);

/// Replacement for the build import region. It matches `BUILD_IMPORT_PATTERN`
/// only as a whole, so rewriting it again yields the same text.
pub const CANONICAL_BUILD_IMPORT: &str = concat!(
    "<Import Project=\"$(MSBuildToolsPath)\\Microsoft.CSharp.targets\" />\n",
    "\t<!-- Optionally make the import portable across VS versions -->\n",
    "\t<PropertyGroup>\n",
    "\t\t<VisualStudioVersion Condition=\"'$(VisualStudioVersion)' == ''\">16.0</VisualStudioVersion>\n",
    "\t\t<VSToolsPath Condition=\"'$(VSToolsPath)' == ''\">$(MSBuildExtensionsPath32)\\Microsoft\\VisualStudio\\v$(VisualStudioVersion)</VSToolsPath>\n",
    "\t</PropertyGroup>\n",
    "\t<PropertyGroup>\n",
    "\t\t<TransformOnBuild>true</TransformOnBuild>\n",
    "\t</PropertyGroup>\n",
    "\t<Import Project=\"$(VSToolsPath)\\TextTemplating\\Microsoft.TextTemplating.targets\" />",
);

/// Which rewrites a patch pass applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOptions {
    /// Replace the build import region with `CANONICAL_BUILD_IMPORT`
    pub rewrite_build_import: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            rewrite_build_import: true,
        }
    }
}

/// Marks a template entry that has already been rewritten
const PREPROCESSOR_GENERATOR: &str = "<Generator>TextTemplatingFilePreprocessor</Generator>";

/// Result of patching one project file's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    /// Rewritten content
    pub content: String,

    /// Number of template references found
    pub template_count: usize,
}

impl Patched {
    /// Whether the rewrite changed anything compared to `original`
    pub fn changed(&self, original: &str) -> bool {
        self.content != original
    }

    /// Whether the project declares templates, rewritten now or earlier
    pub fn has_templates(&self) -> bool {
        self.template_count > 0 || self.content.contains(PREPROCESSOR_GENERATOR)
    }
}

/// Regex rewrite engine for project files
#[derive(Debug, Clone)]
pub struct ProjectFilePatcher {
    template_re: Regex,
    build_import_re: Regex,
}

impl ProjectFilePatcher {
    /// Compile the patch expressions
    pub fn new() -> Result<Self> {
        debug!("ProjectFilePatcher::new: called");
        Ok(Self {
            template_re: Regex::new(TEMPLATE_PATTERN)?,
            build_import_re: Regex::new(BUILD_IMPORT_PATTERN)?,
        })
    }

    /// Rewrite template entries, their compile entries, and the build import
    pub fn patch(&self, content: &str, options: &PatchOptions) -> Patched {
        debug!(len = content.len(), ?options, "ProjectFilePatcher::patch: called");
        let mut content = content.to_string();

        let template_paths: Vec<(String, String)> = self
            .template_re
            .captures_iter(&content)
            .map(|caps| (caps[0].to_string(), caps["path"].to_string()))
            .collect();
        let template_count = template_paths.len();
        debug!(template_count, "ProjectFilePatcher::patch: template references found");

        for (tag, template_path) in &template_paths {
            let cs_path = derive_cs_path(template_path);
            let cs_file_name = format!("{}{}", file_stem(template_path), CS_EXTENSION);
            debug!(%template_path, %cs_path, %cs_file_name, "ProjectFilePatcher::patch: rewriting template");

            content = content.replace(tag, &content_entry(template_path, &cs_file_name));

            match find_compile_entry(&content, &cs_path) {
                Some(compile_tag) => {
                    debug!(%cs_path, "ProjectFilePatcher::patch: compile entry found");
                    let replacement = compile_entry(&cs_path, file_name(template_path));
                    content = content.replace(&compile_tag, &replacement);
                }
                None => {
                    debug!(%cs_path, "ProjectFilePatcher::patch: no compile entry");
                }
            }
        }

        if options.rewrite_build_import {
            let found = self.build_import_re.find(&content).map(|m| m.as_str().to_string());
            match found {
                Some(region) => {
                    debug!(len = region.len(), "ProjectFilePatcher::patch: build import found");
                    // Plain string replace: the replacement holds literal `$(...)`
                    content = content.replace(&region, CANONICAL_BUILD_IMPORT);
                }
                None => {
                    debug!("ProjectFilePatcher::patch: no build import");
                }
            }
        }

        Patched {
            content,
            template_count,
        }
    }
}

fn content_entry(template_path: &str, cs_file_name: &str) -> String {
    format!(
        "<Content Include=\"{template_path}\">\n\
         \t\t{PREPROCESSOR_GENERATOR}\n\
         \t\t<LastGenOutput>{cs_file_name}</LastGenOutput>\n\
         \t</Content>\n"
    )
}

fn compile_entry(cs_path: &str, template_file_name: &str) -> String {
    format!(
        "<Compile Include=\"{cs_path}\">\n\
         \t\t<AutoGen>True</AutoGen>\n\
         \t\t<DesignTime>True</DesignTime>\n\
         \t\t<DependentUpon>{template_file_name}</DependentUpon>\n\
         \t</Compile>\n"
    )
}

/// Find `<Compile Include="cs_path" />` or `<Compile Include="cs_path">...</Compile>`
/// where the body closes on the same line. The body extends to the last
/// `</Compile>` of that line.
fn find_compile_entry(content: &str, cs_path: &str) -> Option<String> {
    let opening = format!("<Compile Include=\"{cs_path}\"");
    let mut offset = 0;

    while let Some(pos) = content[offset..].find(&opening) {
        let start = offset + pos;
        let rest = &content[start + opening.len()..];

        if rest.starts_with(" />") {
            return Some(content[start..start + opening.len() + 3].to_string());
        }

        if rest.starts_with('>') {
            let line = rest.split('\n').next().unwrap_or(rest);
            if let Some(close) = line.rfind("</Compile>") {
                let end = start + opening.len() + close + "</Compile>".len();
                return Some(content[start..end].to_string());
            }
        }

        offset = start + opening.len();
    }

    None
}

/// `Assets\Gen\Foo.tt` -> `Assets\Gen\Foo.cs`
fn derive_cs_path(template_path: &str) -> String {
    match template_path.strip_suffix(TEMPLATE_EXTENSION) {
        Some(stem) => format!("{stem}{CS_EXTENSION}"),
        None => template_path.to_string(),
    }
}

/// File name of a project-relative path, accepting both separators
fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// File name without its final extension
fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}
