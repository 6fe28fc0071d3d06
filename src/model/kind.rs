use serde::{Deserialize, Serialize};
use std::fmt;

/// Every resource kind the registry serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Assembly,
    AssemblyFactory,
    StacksFactory,
    Plan,
    BuildConfig,
    Build,
    ImageReference,
    ImageMarks,
    Node,
    Volume,
    Job,
    Secret,
    Service,
    Endpoint,
    Ingress,
    HorizontalScaling,
    VerticalScaling,
    Team,
    Origin,
    Role,
    Permission,
    StoragePool,
    StorageConnector,
    Network,
    Datacenter,
    License,
    SettingsMap,
}

/// Answer given when a request carries neither credential header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Unauthorized,
    NotAcceptable,
}

/// How many owner references a payload has to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerRule {
    Optional,
    AtLeast(usize),
    ExactlyOne,
}

use ResourceKind::*;

impl ResourceKind {
    pub const ALL: [ResourceKind; 27] = [
        Assembly,
        AssemblyFactory,
        StacksFactory,
        Plan,
        BuildConfig,
        Build,
        ImageReference,
        ImageMarks,
        Node,
        Volume,
        Job,
        Secret,
        Service,
        Endpoint,
        Ingress,
        HorizontalScaling,
        VerticalScaling,
        Team,
        Origin,
        Role,
        Permission,
        StoragePool,
        StorageConnector,
        Network,
        Datacenter,
        License,
        SettingsMap,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Assembly => "Assembly",
            AssemblyFactory => "AssemblyFactory",
            StacksFactory => "StacksFactory",
            Plan => "Plan",
            BuildConfig => "BuildConfig",
            Build => "Build",
            ImageReference => "ImageReference",
            ImageMarks => "ImageMarks",
            Node => "Node",
            Volume => "Volume",
            Job => "Job",
            Secret => "Secret",
            Service => "Service",
            Endpoint => "Endpoint",
            Ingress => "Ingress",
            HorizontalScaling => "HorizontalScaling",
            VerticalScaling => "VerticalScaling",
            Team => "Team",
            Origin => "Origin",
            Role => "Role",
            Permission => "Permission",
            StoragePool => "StoragePool",
            StorageConnector => "StorageConnector",
            Network => "Network",
            Datacenter => "Datacenter",
            License => "License",
            SettingsMap => "SettingsMap",
        }
    }

    /// `kind` of the list envelope, e.g. `AssemblyFactoryList`.
    pub fn list_kind(&self) -> String {
        format!("{}List", self.name())
    }

    /// URL segment of the kind's collection.
    pub fn collection(&self) -> &'static str {
        match self {
            Assembly => "assemblys",
            AssemblyFactory => "assemblyfactorys",
            StacksFactory => "stacksfactorys",
            Plan => "plans",
            BuildConfig => "buildconfigs",
            Build => "builds",
            ImageReference => "imagereferences",
            ImageMarks => "imagemarks",
            Node => "nodes",
            Volume => "volumes",
            Job => "jobs",
            Secret => "secrets",
            Service => "services",
            Endpoint => "endpoints",
            Ingress => "ingresses",
            HorizontalScaling => "horizontalscaling",
            VerticalScaling => "verticalscaling",
            Team => "teams",
            Origin => "origins",
            Role => "roles",
            Permission => "permissions",
            StoragePool => "storagespool",
            StorageConnector => "storageconnectors",
            Network => "networks",
            Datacenter => "datacenters",
            License => "licenses",
            SettingsMap => "settingsmap",
        }
    }

    /// Case-insensitive lookup by kind name (`"buildconfig"` → `BuildConfig`).
    pub fn from_name(name: &str) -> Option<ResourceKind> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Kinds accepted in `object_meta.owner_references`.
    pub fn owner_kinds(&self) -> &'static [ResourceKind] {
        match self {
            Assembly => &[AssemblyFactory],
            AssemblyFactory => &[StacksFactory],
            BuildConfig => &[AssemblyFactory],
            Build => &[BuildConfig],
            ImageReference => &[BuildConfig],
            ImageMarks => &[Build],
            Volume => &[Assembly, StoragePool],
            Job => &[Assembly, AssemblyFactory, Node],
            Service => &[AssemblyFactory],
            Endpoint => &[Assembly],
            Ingress => &[AssemblyFactory, Service],
            HorizontalScaling => &[AssemblyFactory],
            VerticalScaling => &[AssemblyFactory],
            _ => &[],
        }
    }

    /// Kinds referenced through typed body fields instead of owner references.
    pub fn field_parent_kinds(&self) -> &'static [ResourceKind] {
        match self {
            AssemblyFactory | StacksFactory => &[Plan, Secret],
            Permission => &[Role],
            StoragePool => &[StorageConnector],
            Datacenter => &[Node, Network, StorageConnector],
            Job => &[Node],
            _ => &[],
        }
    }

    /// Every kind a child of this kind may be listed under.
    pub fn parent_kinds(&self) -> Vec<ResourceKind> {
        let mut parents: Vec<ResourceKind> = self.owner_kinds().to_vec();
        for kind in self.field_parent_kinds() {
            if !parents.contains(kind) {
                parents.push(*kind);
            }
        }
        parents
    }

    pub fn owner_rule(&self) -> OwnerRule {
        match self {
            BuildConfig | Build | ImageReference | ImageMarks | Service | Endpoint => {
                OwnerRule::AtLeast(1)
            }
            // the factory and the service it routes to
            Ingress => OwnerRule::AtLeast(2),
            HorizontalScaling | VerticalScaling => OwnerRule::ExactlyOne,
            _ => OwnerRule::Optional,
        }
    }

    /// Tenant kinds live inside an account; cluster kinds are system scoped.
    pub fn requires_account(&self) -> bool {
        !matches!(
            self,
            Node | Network
                | Datacenter
                | StoragePool
                | StorageConnector
                | License
                | SettingsMap
                | Plan
                | Role
                | Permission
        )
    }

    pub fn requires_cluster_name(&self) -> bool {
        matches!(self, Assembly | AssemblyFactory | StacksFactory | Team)
    }

    pub fn gate(&self) -> Gate {
        match self {
            AssemblyFactory | StacksFactory | Build | ImageMarks | Job | Secret | Service
            | Endpoint | Ingress | Origin | Network | License => Gate::Unauthorized,
            _ => Gate::NotAcceptable,
        }
    }

    /// Kinds reachable under `/accounts/{account_id}/{collection}`.
    pub fn account_scoped(&self) -> bool {
        matches!(
            self,
            AssemblyFactory
                | Assembly
                | Secret
                | StacksFactory
                | BuildConfig
                | Build
                | Service
                | Volume
                | Origin
                | Team
        )
    }

    /// Primary child joined by `GET /{collection}/{id}/describe`.
    pub fn describe_child(&self) -> Option<ResourceKind> {
        match self {
            AssemblyFactory => Some(Assembly),
            StacksFactory => Some(AssemblyFactory),
            BuildConfig => Some(Build),
            Build => Some(ImageMarks),
            Assembly => Some(Volume),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
