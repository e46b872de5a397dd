//! Hyper-V virtual disk templates.
//!
//! Each body reads its arguments from `$request` (see
//! [`ScriptTemplate::render`](crate::ScriptTemplate::render)). Argument
//! properties are PascalCase.
//!
//! Every template is safe to run again with the same arguments.

use crate::template::{ScriptTemplate, Verb};

/// Create a disk unless one already exists at `Path`.
///
/// Arguments: `Path`, `Source`, `SourceVm`, `SourceDisk`, `VhdType`,
/// `ParentPath`, `Size`, `BlockSize`, `LogicalSectorSize`,
/// `PhysicalSectorSize`, `Replace`.
///
/// With `Replace` an existing file is removed first. A positive `Size` on a
/// disk without a parent is honored after creation by growing the disk.
pub const CREATE_OR_UPDATE_VHD: ScriptTemplate = ScriptTemplate::new(
    "CreateOrUpdateVhd",
    Verb::CreateOrUpdate,
    r#"
Import-Module Hyper-V
$path = $request.Path

if ($request.Replace -and (Test-Path -LiteralPath $path)) {
    Remove-Item -LiteralPath $path -Force
}

if (!(Test-Path -LiteralPath $path)) {
    $directory = Split-Path -Path $path -Parent
    if ($directory -and !(Test-Path -LiteralPath $directory)) {
        New-Item -ItemType Directory -Path $directory -Force | Out-Null
    }

    if ($request.Source) {
        $source = $request.Source
        $download = $null
        if ($source -match '^https?://') {
            $extension = [System.IO.Path]::GetExtension(([uri]$source).AbsolutePath)
            $download = Join-Path $env:TEMP ([System.IO.Path]::GetRandomFileName() + $extension)
            Invoke-WebRequest -Uri $source -OutFile $download -UseBasicParsing
            $source = $download
        }

        if ([System.IO.Path]::GetExtension($source) -eq '.zip') {
            $expanded = Join-Path $env:TEMP ([System.IO.Path]::GetRandomFileName())
            Expand-Archive -LiteralPath $source -DestinationPath $expanded -Force
            $disk = Get-ChildItem -LiteralPath $expanded -Recurse -File |
                Where-Object { $_.Extension -in '.vhd', '.vhdx' } |
                Select-Object -First 1
            if (!$disk) {
                throw "archive $($request.Source) contains no virtual disk"
            }
            Move-Item -LiteralPath $disk.FullName -Destination $path -Force
            Remove-Item -LiteralPath $expanded -Recurse -Force
        } else {
            Copy-Item -LiteralPath $source -Destination $path -Force
        }

        if ($download) {
            Remove-Item -LiteralPath $download -Force -ErrorAction SilentlyContinue
        }
    } elseif ($request.SourceVm) {
        $drive = Get-VMHardDiskDrive -VMName $request.SourceVm |
            Select-Object -Index $request.SourceDisk
        if (!$drive) {
            throw "vm $($request.SourceVm) has no hard disk at index $($request.SourceDisk)"
        }
        Copy-Item -LiteralPath $drive.Path -Destination $path -Force
    } elseif ($request.ParentPath) {
        New-VHD -Path $path -ParentPath $request.ParentPath -Differencing | Out-Null
    } else {
        if ($request.Size -le 0) {
            throw "size is required to create blank disk $path"
        }
        $params = @{ Path = $path; SizeBytes = $request.Size }
        if ($request.VhdType -eq 'Fixed') {
            $params.Fixed = $true
        } else {
            $params.Dynamic = $true
        }
        if ($request.BlockSize -gt 0) {
            $params.BlockSizeBytes = $request.BlockSize
        }
        if ($request.LogicalSectorSize -gt 0) {
            $params.LogicalSectorSizeBytes = $request.LogicalSectorSize
        }
        if ($request.PhysicalSectorSize -gt 0) {
            $params.PhysicalSectorSizeBytes = $request.PhysicalSectorSize
        }
        New-VHD @params | Out-Null
    }
}

if ($request.Size -gt 0 -and !$request.ParentPath) {
    $vhd = Get-VHD -Path $path
    if ($vhd.Size -lt $request.Size) {
        Resize-VHD -Path $path -SizeBytes $request.Size
    }
}
"#,
);

/// Report a disk as a compressed JSON object, or `{}` if it does not exist.
///
/// Arguments: `Path`.
pub const GET_VHD: ScriptTemplate = ScriptTemplate::new(
    "GetVhd",
    Verb::Read,
    r#"
Import-Module Hyper-V

if (Test-Path -LiteralPath $request.Path) {
    $vhd = Get-VHD -Path $request.Path
    [pscustomobject]@{
        Path               = $vhd.Path
        Size               = $vhd.Size
        FileSize           = $vhd.FileSize
        MinimumSize        = $vhd.MinimumSize
        VhdType            = [string]$vhd.VhdType
        VhdFormat          = [string]$vhd.VhdFormat
        ParentPath         = [string]$vhd.ParentPath
        BlockSize          = $vhd.BlockSize
        LogicalSectorSize  = $vhd.LogicalSectorSize
        PhysicalSectorSize = $vhd.PhysicalSectorSize
        Attached           = $vhd.Attached
    } | ConvertTo-Json -Compress
} else {
    '{}'
}
"#,
);

/// Grow or shrink a disk to `Size` bytes.
///
/// Arguments: `Path`, `Size`.
pub const RESIZE_VHD: ScriptTemplate = ScriptTemplate::new(
    "ResizeVhd",
    Verb::Resize,
    r#"
Import-Module Hyper-V
Resize-VHD -Path $request.Path -SizeBytes $request.Size
"#,
);

/// Remove a disk and its sibling files.
///
/// Arguments: `Path`.
///
/// Siblings are the files next to the disk whose base name equals the disk's
/// base name or starts with it followed by `_` (checkpoint files Hyper-V
/// names `<disk>_<guid>.avhdx`). Zero matches, or a missing directory, is
/// success.
pub const DELETE_VHD: ScriptTemplate = ScriptTemplate::new(
    "DeleteVhd",
    Verb::Delete,
    r#"
$directory = Split-Path -Path $request.Path -Parent
$baseName = [System.IO.Path]::GetFileNameWithoutExtension($request.Path)
if (!$baseName) {
    throw "$($request.Path) does not name a disk file"
}

if ($directory -and (Test-Path -LiteralPath $directory)) {
    Get-ChildItem -LiteralPath $directory -File |
        Where-Object { $_.BaseName -eq $baseName -or $_.BaseName.StartsWith($baseName + '_') } |
        ForEach-Object { Remove-Item -LiteralPath $_.FullName -Force }
}
"#,
);

/// All Hyper-V disk templates.
pub const ALL: [ScriptTemplate; 4] = [CREATE_OR_UPDATE_VHD, GET_VHD, RESIZE_VHD, DELETE_VHD];
