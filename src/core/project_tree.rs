//! # Project Tree
//!
//! The intermediate representation of an emitted project file: an attributed tree of
//! [`ProjectTreeNode`]s, filled through the fluent [`ProjectTreeBuilder`] and turned
//! into text by [`render_tree`].
//!
//! Rendering is deterministic. Attributes keep their insertion order and re-rendering
//! an unchanged tree reproduces the previous output byte for byte.

use crate::core::identity::Capability;
use crate::models::LunaConfig;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A labeled tree node. A node carries either an inline value or children, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectTreeNode {
    pub name: String,
    value: String,
    children: Vec<ProjectTreeNode>,
    attributes: Vec<(String, String)>,
}

impl ProjectTreeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A node holding an inline value.
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn with_child(mut self, child: Self) -> Self {
        self.push_child(child);
        self
    }

    /// Sets an attribute, replacing an existing one with the same key in place.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Turns the node into a leaf. Existing children are dropped.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.children.clear();
        self.value = value.into();
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Appends a child. A leaf becomes a branch and loses its inline value.
    pub fn push_child(&mut self, child: Self) {
        self.value.clear();
        self.children.push(child);
    }

    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Depth-first search for every descendant named `name`.
    pub fn descendants_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Self>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.descendants_named(name, found);
        }
    }
}

/// Renders a tree in the XML-like project file layout, indenting children by one tab
/// per level and ending every line with `\r\n`.
pub fn render_tree(node: &ProjectTreeNode) -> String {
    let mut buffer = String::new();
    render_into(&mut buffer, node, "");
    buffer
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn render_into(buffer: &mut String, node: &ProjectTreeNode, indent: &str) {
    buffer.push_str(indent);
    buffer.push('<');
    buffer.push_str(&node.name);

    if !node.attributes.is_empty() {
        buffer.push(' ');
        for (key, value) in &node.attributes {
            buffer.push_str(&format!("{}=\"{}\" ", key, escape_attribute(value)));
        }
    }

    if !node.value.is_empty() {
        buffer.push_str(&format!(">{}</{}>\r\n", escape_text(&node.value), node.name));
    } else if !node.children.is_empty() {
        buffer.push_str(">\r\n");
        let child_indent = format!("{}\t", indent);
        for child in &node.children {
            render_into(buffer, child, &child_indent);
        }
        buffer.push_str(&format!("{}</{}>\r\n", indent, node.name));
    } else {
        buffer.push_str("/>\r\n");
    }
}

/// One file to attach to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute, or relative to the directory of the declaring build script.
    pub physical_path: PathBuf,
    /// Where the file appears inside the project.
    pub solution_path: String,
    /// Item element name, `Compile` by default.
    pub element_tag: String,
}

impl FileRecord {
    pub fn compile(physical_path: impl Into<PathBuf>, solution_path: impl Into<String>) -> Self {
        Self::tagged(physical_path, solution_path, "Compile")
    }

    pub fn tagged(
        physical_path: impl Into<PathBuf>,
        solution_path: impl Into<String>,
        element_tag: impl Into<String>,
    ) -> Self {
        Self {
            physical_path: physical_path.into(),
            solution_path: solution_path.into(),
            element_tag: element_tag.into(),
        }
    }
}

/// Workspace wide settings the builder stamps into every project. Registered as a
/// meta service so plugins can replace it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConventions {
    pub sdk: String,
    pub target_framework: String,
    /// Where build outputs are copied by the post build steps.
    pub output_path: PathBuf,
    /// Solution directory, used to resolve project references.
    pub solution_path: PathBuf,
}

impl Capability for ProjectConventions {
    const GUID: Uuid = Uuid::from_u128(0x3d8e_51b2_6c0f_4f7a_a1d4_92e7_0b6c_5f31);
    const NAME: &'static str = "Project Conventions";
}

impl ProjectConventions {
    pub fn from_config(config: &LunaConfig) -> Self {
        Self {
            sdk: "Microsoft.NET.Sdk".to_string(),
            target_framework: "net8.0".to_string(),
            output_path: config.output_path.clone(),
            solution_path: config.solution_path.clone(),
        }
    }

    fn copy_command(&self, file: &str, subfolder: &str) -> String {
        format!(
            "xcopy \"$(ProjectDir)$(OutDir)$(TargetName).{}\" \"{}\\$(Platform)_$(Configuration)\\{}\" /y",
            file,
            self.output_path.display(),
            subfolder
        )
    }
}

/// Fluent accumulator for one project tree.
///
/// Every method returns `&mut Self`. Without an active root (see
/// [`ProjectTreeBuilder::detached`]) every method does nothing.
#[derive(Debug)]
pub struct ProjectTreeBuilder<'a> {
    root: Option<&'a mut ProjectTreeNode>,
    source_location: PathBuf,
    conventions: &'a ProjectConventions,
}

impl<'a> ProjectTreeBuilder<'a> {
    /// A builder mutating `root`. `source_location` is the build script that declares
    /// the project.
    pub fn new(
        root: &'a mut ProjectTreeNode,
        source_location: &Path,
        conventions: &'a ProjectConventions,
    ) -> Self {
        Self {
            root: Some(root),
            source_location: source_location.to_path_buf(),
            conventions,
        }
    }

    /// A builder without an active root.
    pub fn detached(source_location: &Path, conventions: &'a ProjectConventions) -> Self {
        Self {
            root: None,
            source_location: source_location.to_path_buf(),
            conventions,
        }
    }

    pub fn is_active(&self) -> bool {
        self.root.is_some()
    }

    /// Runs `configure` against `root` as the active tree. This builder's own root is
    /// untouched and active again once `configure` returns.
    pub fn with_root<F>(&mut self, root: &mut ProjectTreeNode, configure: F) -> &mut Self
    where
        F: FnOnce(&mut ProjectTreeBuilder<'_>),
    {
        let mut nested = ProjectTreeBuilder {
            root: Some(root),
            source_location: self.source_location.clone(),
            conventions: self.conventions,
        };
        configure(&mut nested);
        self
    }

    fn base_setup(&mut self) -> &mut Self {
        let sdk = self.conventions.sdk.clone();
        if let Some(root) = self.root.as_deref_mut() {
            root.set_attribute("Sdk", sdk);
        }
        self
    }

    pub fn as_library(&mut self) -> &mut Self {
        if !self.is_active() {
            return self;
        }
        self.base_setup();

        let group = ProjectTreeNode::new("PropertyGroup")
            .with_child(ProjectTreeNode::leaf(
                "TargetFramework",
                self.conventions.target_framework.clone(),
            ))
            .with_child(ProjectTreeNode::leaf("ImplicitUsings", "enable"))
            .with_child(ProjectTreeNode::leaf("Nullable", "enable"));

        if let Some(root) = self.root.as_deref_mut() {
            root.push_child(group);
        }
        self
    }

    /// A library whose binaries are copied to the output path.
    pub fn as_standalone_library(&mut self) -> &mut Self {
        if !self.is_active() {
            return self;
        }
        self.as_library();
        let commands = [
            self.conventions.copy_command("dll", ""),
            self.conventions.copy_command("pdb", ""),
        ];
        self.add_post_build_commands(&commands)
    }

    /// An executable whose binaries and runtime config are copied to the output path.
    pub fn as_console_launcher(&mut self) -> &mut Self {
        if !self.is_active() {
            return self;
        }
        self.as_library();

        if let Some(group) = self
            .root
            .as_deref_mut()
            .and_then(|root| root.child_mut("PropertyGroup"))
        {
            group.push_child(ProjectTreeNode::leaf("OutputType", "Exe"));
            group.push_child(ProjectTreeNode::leaf("PublishAot", "true"));
            group.push_child(ProjectTreeNode::leaf("InvariantGlobalization", "true"));
        }

        let commands = [
            self.conventions.copy_command("dll", ""),
            self.conventions.copy_command("pdb", ""),
            self.conventions.copy_command("exe", ""),
            self.conventions.copy_command("runtimeconfig.json", ""),
        ];
        self.add_post_build_commands(&commands)
    }

    /// A library copied into the `Plugins` output folder.
    pub fn as_plugin(&mut self) -> &mut Self {
        self.as_copied_library("Plugins\\")
    }

    /// A library copied into the `Targets` output folder.
    pub fn as_target(&mut self) -> &mut Self {
        self.as_copied_library("Targets\\")
    }

    fn as_copied_library(&mut self, subfolder: &str) -> &mut Self {
        if !self.is_active() {
            return self;
        }
        self.as_library();
        let commands = [
            self.conventions.copy_command("dll", subfolder),
            self.conventions.copy_command("pdb", subfolder),
        ];
        self.add_post_build_commands(&commands)
    }

    /// Adds an item group with the given files.
    ///
    /// Relative paths are resolved against the directory of the declaring build script.
    /// Missing files are logged and skipped. The build script itself is always attached
    /// as a `None` item so the project links back to where it was declared.
    pub fn add_files(&mut self, files: &[FileRecord]) -> &mut Self {
        if !self.is_active() {
            return self;
        }

        let base_dir = self
            .source_location
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let mut item_group = ProjectTreeNode::new("ItemGroup");

        for file in files {
            let path = if file.physical_path.is_absolute() {
                file.physical_path.clone()
            } else {
                base_dir.join(&file.physical_path)
            };

            if !path.is_file() {
                log::error!("File: {} does not exist.", path.display());
                continue;
            }

            item_group.push_child(
                ProjectTreeNode::new(file.element_tag.clone())
                    .with_attribute("Include", path.display().to_string())
                    .with_attribute("Link", file.solution_path.clone()),
            );
        }

        let script_name = self
            .source_location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        item_group.push_child(
            ProjectTreeNode::new("None")
                .with_attribute("Include", self.source_location.display().to_string())
                .with_attribute("Link", script_name),
        );

        if let Some(root) = self.root.as_deref_mut() {
            root.push_child(item_group);
        }
        self
    }

    /// Adds project references by project name.
    pub fn add_references(&mut self, projects: &[String]) -> &mut Self {
        if !self.is_active() {
            return self;
        }

        let mut item_group = ProjectTreeNode::new("ItemGroup");
        for reference in projects {
            item_group.push_child(ProjectTreeNode::new("ProjectReference").with_attribute(
                "Include",
                format!(
                    "{}\\**\\{}.csproj",
                    self.conventions.solution_path.display(),
                    reference
                ),
            ));
        }

        if let Some(root) = self.root.as_deref_mut() {
            root.push_child(item_group);
        }
        self
    }

    pub fn add_post_build_commands(&mut self, commands: &[String]) -> &mut Self {
        self.add_build_step("PostBuild", "AfterTargets", "PostBuildEvent", commands)
    }

    pub fn add_pre_build_commands(&mut self, commands: &[String]) -> &mut Self {
        self.add_build_step("PreBuild", "BeforeTargets", "PreBuildEvent", commands)
    }

    fn add_build_step(
        &mut self,
        name: &str,
        hook: &str,
        event: &str,
        commands: &[String],
    ) -> &mut Self {
        let Some(root) = self.root.as_deref_mut() else {
            return self;
        };

        let mut target = ProjectTreeNode::new("Target")
            .with_attribute("Name", name)
            .with_attribute(hook, event);
        for command in commands {
            target.push_child(
                ProjectTreeNode::new("Exec").with_attribute("Command", command.as_str()),
            );
        }
        root.push_child(target);
        self
    }

    /// Adds a property group with free-form properties.
    pub fn add_properties<'p, I>(&mut self, properties: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'p str, &'p str)>,
    {
        let Some(root) = self.root.as_deref_mut() else {
            return self;
        };

        let mut group = ProjectTreeNode::new("PropertyGroup");
        for (key, value) in properties {
            group.push_child(ProjectTreeNode::leaf(key, value));
        }
        if !group.children().is_empty() {
            root.push_child(group);
        }
        self
    }
}
