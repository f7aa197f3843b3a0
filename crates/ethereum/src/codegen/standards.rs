//! Interface standard detection by function-name sets

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Known contract interface standards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterfaceStandard {
    #[serde(rename = "ERC20")]
    Erc20,
    #[serde(rename = "ERC721")]
    Erc721,
    #[serde(rename = "ERC1155")]
    Erc1155,
    #[serde(rename = "ERC4626")]
    Erc4626,
}

impl InterfaceStandard {
    /// Candidates in tie-break order
    pub const ALL: [InterfaceStandard; 4] = [
        InterfaceStandard::Erc4626,
        InterfaceStandard::Erc721,
        InterfaceStandard::Erc1155,
        InterfaceStandard::Erc20,
    ];

    /// Function names a contract must expose to match
    pub fn required_functions(&self) -> &'static [&'static str] {
        match self {
            InterfaceStandard::Erc20 => &[
                "totalSupply",
                "balanceOf",
                "transfer",
                "transferFrom",
                "approve",
                "allowance",
            ],
            InterfaceStandard::Erc721 => &[
                "balanceOf",
                "ownerOf",
                "safeTransferFrom",
                "transferFrom",
                "approve",
                "setApprovalForAll",
                "getApproved",
                "isApprovedForAll",
            ],
            InterfaceStandard::Erc1155 => &[
                "balanceOf",
                "balanceOfBatch",
                "setApprovalForAll",
                "isApprovedForAll",
                "safeTransferFrom",
                "safeBatchTransferFrom",
            ],
            InterfaceStandard::Erc4626 => &[
                "asset",
                "totalAssets",
                "convertToShares",
                "convertToAssets",
                "maxDeposit",
                "previewDeposit",
                "deposit",
                "maxMint",
                "previewMint",
                "mint",
                "maxWithdraw",
                "previewWithdraw",
                "withdraw",
                "maxRedeem",
                "previewRedeem",
                "redeem",
                // ERC4626 vaults are ERC20 share tokens
                "totalSupply",
                "balanceOf",
                "transfer",
                "transferFrom",
                "approve",
                "allowance",
            ],
        }
    }

    /// Short identifier, e.g. `ERC20`
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceStandard::Erc20 => "ERC20",
            InterfaceStandard::Erc721 => "ERC721",
            InterfaceStandard::Erc1155 => "ERC1155",
            InterfaceStandard::Erc4626 => "ERC4626",
        }
    }

    /// Human-readable server name
    pub fn display_name(&self) -> &'static str {
        match self {
            InterfaceStandard::Erc20 => "ERC20 Token",
            InterfaceStandard::Erc721 => "ERC721 NFT",
            InterfaceStandard::Erc1155 => "ERC1155 Multi Token",
            InterfaceStandard::Erc4626 => "ERC4626 Vault",
        }
    }
}

impl fmt::Display for InterfaceStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the most specific standard whose required functions are all present.
///
/// Specificity is the size of the required set; ties keep the earlier entry of
/// [`InterfaceStandard::ALL`].
pub fn detect_standard<'a, I>(function_names: I) -> Option<InterfaceStandard>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: BTreeSet<&str> = function_names.into_iter().collect();

    let mut best: Option<InterfaceStandard> = None;
    for candidate in InterfaceStandard::ALL {
        let required = candidate.required_functions();
        if !required.iter().all(|name| present.contains(name)) {
            continue;
        }
        let better = match best {
            Some(current) => required.len() > current.required_functions().len(),
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_extra<'a>(standard: InterfaceStandard, extra: &[&'a str]) -> Vec<&'a str> {
        let mut names: Vec<&str> = standard.required_functions().to_vec();
        names.extend_from_slice(extra);
        names
    }

    #[test]
    fn test_detects_erc20() {
        let names = with_extra(InterfaceStandard::Erc20, &["name", "symbol", "decimals"]);
        assert_eq!(detect_standard(names), Some(InterfaceStandard::Erc20));
    }

    #[test]
    fn test_detects_erc721() {
        let names = with_extra(InterfaceStandard::Erc721, &["tokenURI"]);
        assert_eq!(detect_standard(names), Some(InterfaceStandard::Erc721));
    }

    #[test]
    fn test_detects_erc1155() {
        let names = with_extra(InterfaceStandard::Erc1155, &["uri"]);
        assert_eq!(detect_standard(names), Some(InterfaceStandard::Erc1155));
    }

    #[test]
    fn test_vault_beats_plain_token() {
        // A vault satisfies ERC20 too; the larger requirement set wins
        let names = with_extra(InterfaceStandard::Erc4626, &[]);
        assert_eq!(detect_standard(names), Some(InterfaceStandard::Erc4626));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(detect_standard(["balanceOf", "transfer"]), None);
        assert_eq!(detect_standard(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_superset_of_two_standards_picks_larger() {
        let mut names = with_extra(InterfaceStandard::Erc20, &[]);
        names.extend(InterfaceStandard::Erc721.required_functions());
        assert_eq!(detect_standard(names), Some(InterfaceStandard::Erc721));
    }

    #[test]
    fn test_display_and_serde_names() {
        assert_eq!(InterfaceStandard::Erc20.to_string(), "ERC20");
        assert_eq!(InterfaceStandard::Erc4626.display_name(), "ERC4626 Vault");
        assert_eq!(
            serde_json::to_string(&InterfaceStandard::Erc1155).unwrap(),
            "\"ERC1155\""
        );
    }
}
