// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gravity::{
    ImportRewriter, Settings, extract_doc_fragments, extract_module_utils, rewrite_task_file,
};

const VMWARE_GUEST: &str = r"#!/usr/bin/python
DOCUMENTATION = '''
---
module: vmware_guest
short_description: Manages virtual machines in vCenter
extends_documentation_fragment:
  - vmware.documentation
options:
  name:
    description: Name of the VM.
'''

from ansible.module_utils.basic import AnsibleModule
from ansible.module_utils.six import iteritems
from ansible.module_utils.vmware import (connect_to_api, find_obj, gather_vm_facts, get_all_objs,
                                         compile_folder_path_for_object, serialize_spec,
                                         vmware_argument_spec, set_vm_power_state, PyVmomi)
from ansible.module_utils.network.common.utils import to_list
";

fn benchmark_extract_module_utils(c: &mut Criterion,)
{
    c.bench_function("extract_module_utils", |b| {
        b.iter(|| extract_module_utils(black_box(VMWARE_GUEST,),),)
    },);
}

fn benchmark_extract_doc_fragments(c: &mut Criterion,)
{
    c.bench_function("extract_doc_fragments", |b| {
        b.iter(|| extract_doc_fragments(black_box(VMWARE_GUEST,),).expect("parse failed",),)
    },);
}

fn benchmark_rewrite_imports(c: &mut Criterion,)
{
    let settings = Settings {
        namespace: "acme".to_owned(),
        ..Settings::default()
    };
    let rewriter = ImportRewriter::new(&settings, "cloud_vmware",);

    c.bench_function("rewrite_module_utils_imports", |b| {
        b.iter(|| rewriter.rewrite_module_utils_imports(black_box(VMWARE_GUEST,),),)
    },);
}

fn benchmark_rewrite_large_module(c: &mut Criterion,)
{
    let settings = Settings::default();
    let rewriter = ImportRewriter::new(&settings, "cloud_vmware",);
    let mut source = String::from(VMWARE_GUEST,);
    for i in 0..200 {
        source.push_str(&format!("def helper_{i}(module):\n    return module.params\n\n"),);
    }

    c.bench_function("rewrite_module_utils_imports_large", |b| {
        b.iter(|| rewriter.rewrite_module_utils_imports(black_box(&source,),),)
    },);
}

fn benchmark_rewrite_task_file(c: &mut Criterion,)
{
    let stems = vec!["vmware_guest".to_owned(), "vmware_host".to_owned()];
    let mut tasks = String::new();
    for i in 0..50 {
        tasks.push_str(&format!(
            "- name: create vm {i}\n  vmware_guest:\n    name: vm{i}\n- vmware_host:\n    esxi_hostname: esx{i}\n"
        ),);
    }

    c.bench_function("rewrite_task_file", |b| {
        b.iter(|| {
            rewrite_task_file(black_box(&tasks,), &stems, "acme", "cloud_vmware",)
                .expect("rewrite failed",)
        },)
    },);
}

criterion_group!(
    benches,
    benchmark_extract_module_utils,
    benchmark_extract_doc_fragments,
    benchmark_rewrite_imports,
    benchmark_rewrite_large_module,
    benchmark_rewrite_task_file
);
criterion_main!(benches);
