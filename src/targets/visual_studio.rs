//! Visual Studio 2022 solutions (`.sln`) with SDK-style `.csproj` / `.vcxproj`
//! projects.

use crate::core::identity::{Capability, format_guid};
use crate::core::project_tree::render_tree;
use crate::core::solution::{
    ArtifactDescription, ConfigurationMapping, FolderLayout, MappingKind, SolutionContext,
    SolutionSerializer, WriteReport,
};
use crate::core::target::{self, GenerationContext, Target, TargetError, TargetResult};
use crate::models::{ArtifactKind, LunaConfig};
use std::path::PathBuf;
use uuid::Uuid;

/// Project type guid of solution folders.
pub const FOLDER_TYPE_GUID: Uuid = Uuid::from_u128(0x2150_E333_8FDC_42A3_9474_1A39_56D4_6DE8);
/// Project type guid of C# projects.
pub const CSHARP_TYPE_GUID: Uuid = Uuid::from_u128(0x9A19_103F_16F7_4668_BE54_9A1E_7A4F_7556);
/// Project type guid of C++ projects.
pub const CPP_TYPE_GUID: Uuid = Uuid::from_u128(0x8BC9_CEB8_8B4A_11D0_8D11_00A0_C91B_C942);

/// Identity of the generated Windows solution. Fixed so the solution cache stays valid
/// across runs.
const WINDOWS_SOLUTION_GUID: Uuid = Uuid::from_u128(0x6983_8B76_984D_41BD_AEF5_8FF1_8E5C_9620);

pub fn type_guid(kind: ArtifactKind) -> Uuid {
    match kind {
        ArtifactKind::CSharp => CSHARP_TYPE_GUID,
        ArtifactKind::Cpp => CPP_TYPE_GUID,
    }
}

pub fn extension(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::CSharp => "csproj",
        ArtifactKind::Cpp => "vcxproj",
    }
}

/// Renders `.sln` files and project files.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualStudioSerializer;

impl VisualStudioSerializer {
    fn project_path(artifact: &ArtifactDescription) -> String {
        let mut segments = artifact.path_segments();
        segments.push(&artifact.name);
        format!(
            "{}\\{}.{}",
            segments.join("\\"),
            artifact.name,
            extension(artifact.kind)
        )
    }
}

impl SolutionSerializer for VisualStudioSerializer {
    fn artifact_file(&self, artifact: &ArtifactDescription) -> PathBuf {
        artifact
            .directory()
            .join(format!("{}.{}", artifact.name, extension(artifact.kind)))
    }

    fn render_artifact(&self, artifact: &ArtifactDescription) -> String {
        render_tree(&artifact.root)
    }

    fn render_solution(
        &self,
        solution: &SolutionContext,
        layout: &FolderLayout,
        matrix: &[ConfigurationMapping],
    ) -> String {
        let mut out = String::from(
            "\r\nMicrosoft Visual Studio Solution File, Format Version 12.00\r\n\
             # Visual Studio Version 17\r\nVisualStudioVersion = 17\r\n\
             MinimumVisualStudioVersion = 10\r\n",
        );

        for folder in layout.declared() {
            out.push_str(&format!(
                "Project(\"{}\") = \"{}\", \"{}\", \"{}\"\r\nEndProject\r\n",
                format_guid(FOLDER_TYPE_GUID),
                folder.name,
                folder.name,
                format_guid(folder.guid)
            ));
        }

        for (_, artifact) in solution.artifacts() {
            out.push_str(&format!(
                "Project(\"{}\") = \"{}\", \"{}\", \"{}\"\r\nEndProject\r\n",
                format_guid(type_guid(artifact.kind)),
                artifact.name,
                Self::project_path(artifact),
                format_guid(artifact.guid)
            ));
        }

        out.push_str("Global\r\n");
        out.push_str("\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\r\n");
        for (profile, platform) in solution.configurations() {
            out.push_str(&format!(
                "\t\t{}|{} = {}|{}\r\n",
                profile, platform, profile, platform
            ));
        }
        out.push_str("\tEndGlobalSection\r\n");

        out.push_str("\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\r\n");
        for mapping in matrix {
            let suffix = match mapping.kind {
                MappingKind::ActiveCfg => "ActiveCfg",
                MappingKind::Build0 => "Build.0",
            };
            out.push_str(&format!(
                "\t\t{}.{}|{}.{} = {}|{}\r\n",
                format_guid(mapping.artifact),
                mapping.profile,
                mapping.platform,
                suffix,
                mapping.profile,
                mapping.platform
            ));
        }
        out.push_str("\tEndGlobalSection\r\n");

        out.push_str("\tGlobalSection(SolutionProperties) = preSolution\r\n");
        out.push_str("\t\tHideSolutionNode = FALSE\r\n");
        out.push_str("\tEndGlobalSection\r\n");

        out.push_str("\tGlobalSection(NestedProjects) = preSolution\r\n");
        for (child, parent) in layout.nesting() {
            out.push_str(&format!(
                "\t\t{} = {}\r\n",
                format_guid(child),
                format_guid(parent)
            ));
        }
        out.push_str("\tEndGlobalSection\r\n");

        out.push_str("\tGlobalSection(ExtensibilityGlobals) = postSolution\r\n");
        out.push_str(&format!(
            "\t\tSolutionGuid = {}\r\n",
            format_guid(solution.guid())
        ));
        out.push_str("\tEndGlobalSection\r\n");
        out.push_str("EndGlobal\r\n");
        out
    }
}

/// Visual Studio 2022 for Windows x64.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualStudioTarget;

impl Capability for VisualStudioTarget {
    const GUID: Uuid = Uuid::from_u128(0x4c1f_7d2a_0b3e_4e59_8a6c_d2f1_9e0b_7a34);
    const NAME: &'static str = "Visual Studio 2022 - Windows x64";
}

impl VisualStudioTarget {
    /// `<solution path>/Windows/<name>_Windows.sln`
    pub fn solution_file(&self, config: &LunaConfig) -> PathBuf {
        self.full_solution_path(config)
            .join(format!("{}_{}.sln", config.name, self.solution_folder()))
    }
}

impl Target for VisualStudioTarget {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn solution_folder(&self) -> &str {
        "Windows"
    }

    fn generate_solution(&self, ctx: &GenerationContext<'_>) -> TargetResult<WriteReport> {
        let mut solution = SolutionContext::new(
            ctx.config.name.clone(),
            self.solution_file(ctx.config),
            WINDOWS_SOLUTION_GUID,
            ctx.platforms.clone(),
            ctx.profiles.clone(),
        );

        let collected = target::collect_artifacts(&mut solution, ctx);
        log::info!("{}: {} project(s) collected.", self.name(), collected);

        let report = solution.write(&VisualStudioSerializer, ctx.options);
        if report.is_success() {
            Ok(report)
        } else {
            Err(TargetError::Incomplete {
                target: self.name().to_string(),
                failed: report.artifacts_failed + usize::from(report.solution_failed),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::OptionRegistry;
    use crate::core::platforms::NameList;
    use crate::core::registry::Registry;
    use crate::core::target::tests::{StaticBuild, test_config};
    use std::fs;
    use tempfile::tempdir;

    fn two_project_solution() -> SolutionContext {
        let mut solution = SolutionContext::new(
            "Game",
            "Solution/Windows/Game_Windows.sln",
            WINDOWS_SOLUTION_GUID,
            NameList::with_names("platform", ["x64"]),
            NameList::with_names("profile", ["Debug", "Release"]),
        );
        solution.add_artifact(
            ArtifactDescription::new(Uuid::from_u128(0xB), "B", "A", ArtifactKind::CSharp),
            "b.build.toml",
        );
        solution.add_artifact(
            ArtifactDescription::new(Uuid::from_u128(0xC), "C", "A", ArtifactKind::Cpp),
            "c.build.toml",
        );
        solution
    }

    #[test]
    fn test_render_solution_sections() {
        // --- Setup ---
        let solution = two_project_solution();
        let layout = solution.synthesize_folders();
        let matrix = solution.configuration_matrix();

        // --- Execute ---
        let text = VisualStudioSerializer.render_solution(&solution, &layout, &matrix);

        // --- Assert ---
        let folder_a = layout.folder("\\A").unwrap();
        assert_eq!(text.matches("{2150E333-8FDC-42A3-9474-1A3956D46DE8}").count(), 1);
        assert!(text.contains(&format!(
            "Project(\"{{9A19103F-16F7-4668-BE54-9A1E7A4F7556}}\") = \"B\", \"A\\B\\B.csproj\", \"{}\"",
            format_guid(Uuid::from_u128(0xB))
        )));
        assert!(text.contains("\"A\\C\\C.vcxproj\""));
        assert!(text.contains("\t\tDebug|x64 = Debug|x64\r\n"));

        let b = format_guid(Uuid::from_u128(0xB));
        assert_eq!(text.matches(&format!("{}.Debug|x64.ActiveCfg = Debug|x64", b)).count(), 1);
        assert_eq!(text.matches(&format!("{}.Release|x64.Build.0 = Release|x64", b)).count(), 1);
        assert_eq!(text.matches(".ActiveCfg = ").count(), 4);
        assert_eq!(text.matches(".Build.0 = ").count(), 4);

        let nested = format!("\t\t{} = {}\r\n", b, format_guid(folder_a.guid));
        assert!(text.contains(&nested));
        assert!(text.contains(&format!("SolutionGuid = {}", format_guid(WINDOWS_SOLUTION_GUID))));
    }

    #[test]
    fn test_artifact_file_layout() {
        let artifact = ArtifactDescription::new(Uuid::from_u128(1), "Core", "Engine\\Runtime", ArtifactKind::Cpp);
        assert_eq!(
            VisualStudioSerializer.artifact_file(&artifact),
            PathBuf::from("Engine").join("Runtime").join("Core").join("Core.vcxproj")
        );
    }

    #[test]
    fn test_generate_solution_is_incremental() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("Code").join("core.build.toml");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, "name = \"Core\"").unwrap();

        let mut registry = Registry::new();
        registry.register_build_with(Uuid::from_u128(1), Box::new(StaticBuild::named("Core")), Some(source));
        let options = OptionRegistry::new(dir.path().join("Solution").join("lunaCache"));
        let platforms = NameList::with_names("platform", ["x64"]);
        let profiles = NameList::with_names("profile", ["Debug", "Release"]);
        let ctx = GenerationContext {
            registry: &registry,
            options: &options,
            platforms: &platforms,
            profiles: &profiles,
            config: &config,
        };
        let target = VisualStudioTarget;

        // --- Execute ---
        let first = target.generate_solution(&ctx).unwrap();
        let second = target.generate_solution(&ctx).unwrap();

        // --- Assert ---
        assert_eq!(first.files_written(), 2);
        assert_eq!(second.files_written(), 0);
        let sln = target.solution_file(&config);
        assert!(sln.ends_with("Solution/Windows/Game_Windows.sln"));
        let project = sln.parent().unwrap().join("Static").join("Core").join("Core.csproj");
        assert!(project.is_file());
    }
}
