pub mod model;

pub use model::{
    CategoryOption, FoundItem, FoundItemPatch, ItemInfo, ItemInput, ItemStatus, ListFilters,
    MunicipalityInfo, NewFoundItem, PickupInfo, QueryPage, RegistryStats,
};
